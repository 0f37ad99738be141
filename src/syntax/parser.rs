//! Lowering of a tree-sitter Go parse into the owned declaration model.
//!
//! tree-sitter does the actual parsing; this module walks the concrete syntax
//! tree once and copies out what [`SourceFile`] exposes. The tree is error
//! tolerant, so any `ERROR` or `MISSING` node is turned into a parse error here:
//! a half-parsed file must never reach the package model.

use std::path::Path;

use smol_str::SmolStr;
use tree_sitter::{Node, Parser, Tree};

use super::ast::{
    ChanDir, Comment, FieldDecl, ImportSpec, MethodDecl, ReceiverParam, StructType, TypeDecl,
    TypeExpr, TypeExprKind, TypeSpec,
};
use super::constraint::BuildConstraints;
use super::file::SourceFile;
use super::literal::unquote;
use crate::base::{FileId, LineCol, TextRange, TextSize};
use crate::error::{Error, Result};

/// Parses `text` (the contents of `path`) into a [`SourceFile`] with id `file`.
pub fn parse_source(file: FileId, path: &Path, text: &str) -> Result<SourceFile> {
    let tree = parse_tree(path, text)?;
    let root = tree.root_node();
    if let Some(bad) = first_error(root) {
        let message = if bad.is_missing() {
            format!("missing {}", bad.kind())
        } else {
            "syntax error".to_string()
        };
        return Err(Error::parse(path, Some(line_col(bad)), message));
    }
    Lowering { file, path, src: text }.source_file(root)
}

fn parse_tree(path: &Path, text: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|err| Error::parse(path, None, format!("unable to load Go grammar: {err}")))?;
    parser
        .parse(text, None)
        .ok_or_else(|| Error::parse(path, None, "parser produced no tree"))
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    // has_error() with no erroneous child: the node itself is the culprit
    found.or(Some(node))
}

fn line_col(node: Node<'_>) -> LineCol {
    let point = node.start_position();
    LineCol::new(point.row as u32, point.column as u32)
}

fn range(node: Node<'_>) -> TextRange {
    TextRange::new(
        TextSize::from(node.start_byte() as u32),
        TextSize::from(node.end_byte() as u32),
    )
}

struct Lowering<'s> {
    file: FileId,
    path: &'s Path,
    src: &'s str,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        &self.src[node.byte_range()]
    }

    fn malformed(&self, node: Node<'_>, what: &str) -> Error {
        Error::parse(
            self.path,
            Some(line_col(node)),
            format!("malformed {}: {what}", node.kind()),
        )
    }

    fn required<'t>(&self, node: Node<'t>, field: &str) -> Result<Node<'t>> {
        node.child_by_field_name(field)
            .ok_or_else(|| self.malformed(node, &format!("no {field}")))
    }

    /// First named child that is not a comment.
    fn first_named<'t>(&self, node: Node<'t>) -> Result<Node<'t>> {
        let mut cursor = node.walk();
        let child = node
            .named_children(&mut cursor)
            .find(|child| child.kind() != "comment");
        child.ok_or_else(|| self.malformed(node, "empty"))
    }

    fn source_file(&self, root: Node<'_>) -> Result<SourceFile> {
        let mut package = None;
        let mut imports = Vec::new();
        let mut type_decls = Vec::new();
        let mut methods = Vec::new();

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_clause" => package = Some(self.package_clause(child)?),
                "import_declaration" => self.imports(child, &mut imports)?,
                "type_declaration" => type_decls.push(self.type_decl(child)?),
                "method_declaration" => methods.push(self.method_decl(child)?),
                _ => {}
            }
        }

        let (package_name, package_range) =
            package.ok_or_else(|| Error::parse(self.path, None, "missing package clause"))?;

        let comments = self.comments(root);
        let leading = comments
            .iter()
            .take_while(|comment| comment.range.start() < package_range.start());
        let constraints = BuildConstraints::from_comments(leading.map(|c| c.text.as_str()))
            .map_err(|err| Error::parse(self.path, None, err.to_string()))?;

        Ok(SourceFile {
            id: self.file,
            path: self.path.to_path_buf(),
            package_name,
            package_range,
            imports,
            type_decls,
            methods,
            comments,
            constraints,
        })
    }

    fn package_clause(&self, node: Node<'_>) -> Result<(SmolStr, TextRange)> {
        let mut cursor = node.walk();
        let name = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "package_identifier")
            .ok_or_else(|| self.malformed(node, "no package name"))?;
        Ok((self.text(name).into(), range(node)))
    }

    fn imports(&self, node: Node<'_>, out: &mut Vec<ImportSpec>) -> Result<()> {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => out.push(self.import_spec(child)?),
                "import_spec_list" => self.imports(child, out)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn import_spec(&self, node: Node<'_>) -> Result<ImportSpec> {
        let path_node = self.required(node, "path")?;
        let path = unquote(self.text(path_node))
            .ok_or_else(|| self.malformed(path_node, "invalid import path literal"))?;
        Ok(ImportSpec {
            name: node
                .child_by_field_name("name")
                .map(|name| self.text(name).into()),
            path: path.into(),
            range: range(node),
        })
    }

    /// Comments ending on the line right above `node`, contiguous, in order.
    fn doc_comments(&self, node: Node<'_>) -> Vec<Comment> {
        let mut doc = Vec::new();
        let mut expected_row = node.start_position().row;
        let mut prev = node.prev_sibling();
        while let Some(sibling) = prev {
            if sibling.kind() != "comment" || sibling.end_position().row + 1 != expected_row {
                break;
            }
            doc.push(self.comment(sibling));
            expected_row = sibling.start_position().row;
            prev = sibling.prev_sibling();
        }
        doc.reverse();
        doc
    }

    fn comment(&self, node: Node<'_>) -> Comment {
        Comment {
            text: self.text(node).into(),
            range: range(node),
            line: node.start_position().row as u32,
        }
    }

    fn comments(&self, root: Node<'_>) -> Vec<Comment> {
        let mut comments = Vec::new();
        let mut cursor = root.walk();
        'walk: loop {
            let node = cursor.node();
            if node.kind() == "comment" {
                comments.push(self.comment(node));
            }
            if cursor.goto_first_child() {
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }
        comments
    }

    fn type_decl(&self, node: Node<'_>) -> Result<TypeDecl> {
        let mut specs = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "type_spec" => specs.push(self.type_spec(child, false)?),
                "type_alias" => specs.push(self.type_spec(child, true)?),
                _ => {}
            }
        }
        Ok(TypeDecl {
            doc: self.doc_comments(node),
            specs,
            range: range(node),
        })
    }

    fn type_spec(&self, node: Node<'_>, is_alias: bool) -> Result<TypeSpec> {
        let name = self.required(node, "name")?;
        let mut type_params = Vec::new();
        if let Some(params) = node.child_by_field_name("type_parameters") {
            let mut cursor = params.walk();
            let decls: Vec<_> = params
                .named_children(&mut cursor)
                .filter(|child| child.kind() == "type_parameter_declaration")
                .collect();
            for decl in decls {
                let mut names = decl.walk();
                type_params.extend(
                    decl.children_by_field_name("name", &mut names)
                        .map(|param| SmolStr::from(self.text(param))),
                );
            }
        }
        Ok(TypeSpec {
            name: self.text(name).into(),
            name_range: range(name),
            type_params,
            is_alias,
            ty: self.type_expr(self.required(node, "type")?)?,
            range: range(node),
        })
    }

    fn type_expr(&self, node: Node<'_>) -> Result<TypeExpr> {
        let boxed = |node| self.type_expr(node).map(Box::new);
        let kind = match node.kind() {
            "type_identifier" => TypeExprKind::Name(self.text(node).into()),
            "qualified_type" => TypeExprKind::Qualified {
                package: self.text(self.required(node, "package")?).into(),
                name: self.text(self.required(node, "name")?).into(),
            },
            "generic_type" => TypeExprKind::Generic {
                base: boxed(self.required(node, "type")?)?,
                args: self.type_args(self.required(node, "type_arguments")?)?,
            },
            "pointer_type" => TypeExprKind::Pointer(boxed(self.first_named(node)?)?),
            "slice_type" => TypeExprKind::Slice(boxed(self.required(node, "element")?)?),
            "array_type" => TypeExprKind::Array {
                len: Some(self.text(self.required(node, "length")?).into()),
                elem: boxed(self.required(node, "element")?)?,
            },
            "implicit_length_array_type" => TypeExprKind::Array {
                len: None,
                elem: boxed(self.required(node, "element")?)?,
            },
            "map_type" => TypeExprKind::Map {
                key: boxed(self.required(node, "key")?)?,
                value: boxed(self.required(node, "value")?)?,
            },
            "channel_type" => TypeExprKind::Chan {
                dir: chan_dir(node),
                elem: boxed(self.required(node, "value")?)?,
            },
            "struct_type" => TypeExprKind::Struct(self.struct_type(node)?),
            "interface_type" => TypeExprKind::Interface(self.text(node).into()),
            "function_type" => TypeExprKind::Func(self.text(node).into()),
            "parenthesized_type" => TypeExprKind::Paren(boxed(self.first_named(node)?)?),
            _ => TypeExprKind::Unsupported(self.text(node).into()),
        };
        Ok(TypeExpr {
            range: range(node),
            kind,
        })
    }

    fn type_args(&self, node: Node<'_>) -> Result<Vec<TypeExpr>> {
        let mut cursor = node.walk();
        let children: Vec<_> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .collect();
        children
            .into_iter()
            .map(|child| match child.kind() {
                // newer grammars wrap each argument in a type_elem
                "type_elem" => self.type_expr(self.first_named(child)?),
                _ => self.type_expr(child),
            })
            .collect()
    }

    fn struct_type(&self, node: Node<'_>) -> Result<StructType> {
        let mut cursor = node.walk();
        let Some(list) = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "field_declaration_list")
        else {
            return Ok(StructType::default());
        };
        let mut cursor = list.walk();
        let decls: Vec<_> = list
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "field_declaration")
            .collect();
        let fields = decls
            .into_iter()
            .map(|decl| self.field_decl(decl))
            .collect::<Result<_>>()?;
        Ok(StructType { fields })
    }

    fn field_decl(&self, node: Node<'_>) -> Result<FieldDecl> {
        let mut cursor = node.walk();
        let names: Vec<SmolStr> = node
            .children_by_field_name("name", &mut cursor)
            .map(|name| self.text(name).into())
            .collect();
        let mut ty = self.type_expr(self.required(node, "type")?)?;
        if names.is_empty() {
            // embedded `*T`: the star is an anonymous token before the type
            let star = node
                .children(&mut cursor)
                .find(|child| !child.is_named() && child.kind() == "*");
            if let Some(star) = star {
                ty = TypeExpr {
                    range: TextRange::new(TextSize::from(star.start_byte() as u32), ty.range.end()),
                    kind: TypeExprKind::Pointer(Box::new(ty)),
                };
            }
        }
        Ok(FieldDecl {
            names,
            ty,
            tag: node
                .child_by_field_name("tag")
                .and_then(|tag| unquote(self.text(tag))),
            range: range(node),
        })
    }

    fn method_decl(&self, node: Node<'_>) -> Result<MethodDecl> {
        let name = self.required(node, "name")?;
        let receiver_list = self.required(node, "receiver")?;
        let mut cursor = receiver_list.walk();
        let params: Vec<_> = receiver_list
            .named_children(&mut cursor)
            .filter(|child| child.kind().ends_with("parameter_declaration"))
            .collect();

        let mut receivers = Vec::new();
        for param in params {
            let ty = self.type_expr(self.required(param, "type")?)?;
            let mut names = param.walk();
            let param_names: Vec<SmolStr> = param
                .children_by_field_name("name", &mut names)
                .map(|name| self.text(name).into())
                .collect();
            if param_names.is_empty() {
                receivers.push(ReceiverParam { name: None, ty });
            } else {
                receivers.extend(param_names.into_iter().map(|name| ReceiverParam {
                    name: Some(name),
                    ty: ty.clone(),
                }));
            }
        }

        Ok(MethodDecl {
            name: self.text(name).into(),
            receivers,
            doc: self.doc_comments(node),
            range: range(node),
        })
    }
}

fn chan_dir(node: Node<'_>) -> ChanDir {
    let mut cursor = node.walk();
    let tokens: Vec<&str> = node
        .children(&mut cursor)
        .filter(|child| !child.is_named())
        .map(|child| child.kind())
        .collect();
    match tokens.as_slice() {
        ["<-", ..] => ChanDir::Recv,
        ["chan", "<-", ..] => ChanDir::Send,
        _ => ChanDir::Both,
    }
}
