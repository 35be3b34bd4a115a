//! Statement and class-definition parsing.
//!
//! The grammar is indentation structured: a suite is either a list of
//! simple statements on the same line or a Newline/Indent delimited
//! block. Once a statement's leading keyword has matched, the rule is
//! committed: failures inside it are fatal syntax errors, never
//! backtracking into a sibling rule.

use super::ast::{
    AttrRole, BlockKind, ClassDef, ClassKind, DataDecl, FuncDef, IfBranch, Module, Pragmas, Stmt,
    StmtKind,
};
use super::pratt::BP_LOWEST;
use super::state::{PResult, ParserState};
use crate::frontend::lexer::TokenKind;

impl ParserState<'_> {
    /// Parse one module: top-level class definitions plus `compile`
    /// directives.
    pub fn parse_module(&mut self, module_name: &str) -> PResult<Module> {
        let span = self.span();
        let mut classes = Vec::new();
        let mut compile_targets = Vec::new();
        loop {
            if self.skip(&TokenKind::Newline) {
                continue;
            }
            match self.current().kind {
                TokenKind::Eof => break,
                TokenKind::KwClass | TokenKind::KwModel | TokenKind::KwProcess => {
                    classes.push(self.parse_class_def()?);
                }
                TokenKind::KwCompile => {
                    self.parse_compile_stmt(&mut compile_targets)?;
                }
                _ => {
                    return Err(self.unexpected(
                        "'class', 'model', 'process' or 'compile'",
                        "module",
                    ))
                }
            }
        }
        Ok(Module {
            name: module_name.to_owned(),
            classes,
            compile_targets,
            span,
        })
    }

    /// `compile Name[, Name...];`
    fn parse_compile_stmt(&mut self, targets: &mut Vec<(String, crate::util::span::Span)>) -> PResult<()> {
        self.bump();
        targets.push(self.identifier("compile directive")?);
        while self.skip(&TokenKind::Comma) {
            targets.push(self.identifier("compile directive")?);
        }
        self.end_of_simple_stmt("compile directive")
    }

    /// `class|model|process Name [(Base)]: body`
    fn parse_class_def(&mut self) -> PResult<ClassDef> {
        let kw = self.bump();
        let kind = match kw.kind {
            TokenKind::KwModel => ClassKind::Model,
            TokenKind::KwProcess => ClassKind::Process,
            _ => ClassKind::Class,
        };
        let (name, name_span) = self.identifier("class definition")?;
        let base = if self.skip(&TokenKind::LParen) {
            let base = self.identifier("base class name")?;
            self.expect(&TokenKind::RParen, "class definition")?;
            Some(base)
        } else {
            None
        };
        self.expect(&TokenKind::Colon, "class definition")?;
        let mut def = ClassDef {
            name,
            kind,
            base,
            data: Vec::new(),
            funcs: Vec::new(),
            pragmas: Pragmas::default(),
            span: kw.span.merge(name_span),
        };
        self.parse_class_body(&mut def)?;
        Ok(def)
    }

    fn parse_class_body(&mut self, def: &mut ClassDef) -> PResult<()> {
        if self.skip(&TokenKind::Newline) {
            self.expect(&TokenKind::Indent, "class body")?;
            while !self.at(&TokenKind::Dedent) {
                if self.skip(&TokenKind::Newline) {
                    continue;
                }
                self.parse_class_item(def)?;
            }
            self.bump();
        } else {
            // single-line body: `class Empty: pass`
            while !matches!(
                self.current().kind,
                TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
            ) {
                self.parse_class_item(def)?;
            }
            self.skip(&TokenKind::Newline);
        }
        Ok(())
    }

    fn parse_class_item(&mut self, def: &mut ClassDef) -> PResult<()> {
        match self.current().kind {
            TokenKind::KwData => {
                let decl = self.parse_data_stmt()?;
                def.data.push(decl);
            }
            TokenKind::KwFunc => {
                let func = self.parse_func_def()?;
                def.funcs.push(func);
            }
            TokenKind::KwBlock => {
                let func = self.parse_block_def()?;
                def.funcs.push(func);
            }
            TokenKind::KwPragma => self.parse_pragma_stmt(def)?,
            TokenKind::KwPass => {
                self.bump();
                self.end_of_simple_stmt("pass statement")?;
            }
            _ => {
                return Err(self.unexpected(
                    "'data', 'func', 'block', 'pragma' or 'pass'",
                    "class body",
                ))
            }
        }
        Ok(())
    }

    /// `data name[, name...]: TypeName [param|const];`
    fn parse_data_stmt(&mut self) -> PResult<DataDecl> {
        let kw = self.bump();
        let mut names = vec![self.identifier("data definition")?];
        while self.skip(&TokenKind::Comma) {
            names.push(self.identifier("data definition")?);
        }
        if !self.at(&TokenKind::Colon) {
            return Err(self.unexpected("':' after attribute list", "data definition"));
        }
        self.bump();
        let (type_name, type_span) = self.identifier("data definition")?;
        let role = if self.skip(&TokenKind::KwParam) {
            AttrRole::Param
        } else if self.skip(&TokenKind::KwConst) {
            AttrRole::Const
        } else {
            AttrRole::Variable
        };
        self.end_of_simple_stmt("data definition")?;
        Ok(DataDecl {
            names,
            type_name,
            type_span,
            role,
            span: kw.span.merge(type_span),
        })
    }

    /// `func name(params): suite`
    fn parse_func_def(&mut self) -> PResult<FuncDef> {
        let kw = self.bump();
        let (name, name_span) = self.identifier("function definition")?;
        self.expect(&TokenKind::LParen, "function definition")?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let (param, _) = self.identifier("parameter list")?;
                params.push(param);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "function definition")?;
        let body = self.parse_stmt_suite("function definition")?;
        Ok(FuncDef {
            kind: BlockKind::from_name(&name),
            name,
            params,
            body,
            span: kw.span.merge(name_span),
        })
    }

    /// `block name: suite` — a parameterless function definition
    fn parse_block_def(&mut self) -> PResult<FuncDef> {
        let kw = self.bump();
        let (name, name_span) = self.identifier("block definition")?;
        let body = self.parse_stmt_suite("block definition")?;
        Ok(FuncDef {
            kind: BlockKind::from_name(&name),
            name,
            params: Vec::new(),
            body,
            span: kw.span.merge(name_span),
        })
    }

    /// `pragma option [option...];` — unknown options are ignored with a
    /// warning so that newer sources still compile
    fn parse_pragma_stmt(&mut self, def: &mut ClassDef) -> PResult<()> {
        self.bump();
        let (first, first_span) = self.identifier("pragma statement")?;
        let mut options = vec![(first, first_span)];
        while let TokenKind::Identifier(_) = self.current().kind {
            options.push(self.identifier("pragma statement")?);
        }
        for (option, span) in options {
            match option.as_str() {
                "no_flatten" => def.pragmas.no_flatten = true,
                "built_in_type" => def.pragmas.built_in_type = true,
                other => {
                    tracing::warn!(pragma = other, at = %span.start, "ignoring unknown pragma")
                }
            }
        }
        self.end_of_simple_stmt("pragma statement")
    }

    /// Suite: `: stmt [; stmt...]` on one line, or `:` Newline Indent
    /// statements Dedent.
    fn parse_stmt_suite(&mut self, context: &str) -> PResult<Vec<Stmt>> {
        self.expect(&TokenKind::Colon, context)?;
        let mut body = Vec::new();
        if self.skip(&TokenKind::Newline) {
            self.expect(&TokenKind::Indent, context)?;
            while !self.at(&TokenKind::Dedent) {
                if self.skip(&TokenKind::Newline) {
                    continue;
                }
                body.push(self.parse_statement()?);
            }
            self.bump();
        } else {
            while !matches!(
                self.current().kind,
                TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
            ) {
                body.push(self.parse_statement()?);
            }
            self.skip(&TokenKind::Newline);
        }
        if body.is_empty() {
            return Err(self.unexpected("at least one statement", context));
        }
        Ok(body)
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        let start = self.span();
        match self.current().kind {
            TokenKind::KwIf => self.parse_if_stmt(),
            TokenKind::KwPass => {
                self.bump();
                self.end_of_simple_stmt("pass statement")?;
                Ok(Stmt {
                    kind: StmtKind::Pass,
                    span: start,
                })
            }
            TokenKind::Dollar => {
                self.bump();
                let target = self.parse_path("differential assignment")?;
                if !self.skip(&TokenKind::ColonAssign) && !self.skip(&TokenKind::Assign) {
                    return Err(
                        self.unexpected("':=' after differential target", "differential assignment")
                    );
                }
                let value = self.parse_expression(BP_LOWEST)?;
                self.end_of_simple_stmt("differential assignment")?;
                let span = start.merge(value.span());
                Ok(Stmt {
                    kind: StmtKind::Assign {
                        target,
                        differential: true,
                        value,
                    },
                    span,
                })
            }
            TokenKind::Identifier(_) => {
                let path = self.parse_path("statement")?;
                if self.at(&TokenKind::LParen) {
                    self.bump();
                    let args = self.parse_call_args()?;
                    let rparen = self.expect(&TokenKind::RParen, "call statement")?;
                    self.end_of_simple_stmt("call statement")?;
                    let span = start.merge(rparen.span);
                    Ok(Stmt {
                        kind: StmtKind::Call { callee: path, args },
                        span,
                    })
                } else if self.skip(&TokenKind::ColonAssign) || self.skip(&TokenKind::Assign) {
                    let value = self.parse_expression(BP_LOWEST)?;
                    self.end_of_simple_stmt("assignment statement")?;
                    let span = start.merge(value.span());
                    Ok(Stmt {
                        kind: StmtKind::Assign {
                            target: path,
                            differential: false,
                            value,
                        },
                        span,
                    })
                } else {
                    Err(self.unexpected("':=' or '(' after name", "statement"))
                }
            }
            _ => Err(self.unexpected("statement", "statement")),
        }
    }

    /// `if cond: suite [elif cond: suite]... [else: suite]`
    fn parse_if_stmt(&mut self) -> PResult<Stmt> {
        let kw = self.bump();
        let mut branches = Vec::new();
        let condition = self.parse_expression(BP_LOWEST)?;
        let body = self.parse_stmt_suite("if statement")?;
        branches.push(IfBranch { condition, body });
        while self.at(&TokenKind::KwElif) {
            self.bump();
            let condition = self.parse_expression(BP_LOWEST)?;
            let body = self.parse_stmt_suite("elif branch")?;
            branches.push(IfBranch { condition, body });
        }
        let else_body = if self.at(&TokenKind::KwElse) {
            self.bump();
            Some(self.parse_stmt_suite("else branch")?)
        } else {
            None
        };
        // suites are never empty, so the last branch has a last statement
        let last = match &else_body {
            Some(body) => body.last(),
            None => branches.last().and_then(|b| b.body.last()),
        };
        let span = last.map_or(kw.span, |stmt| kw.span.merge(stmt.span));
        Ok(Stmt {
            kind: StmtKind::If {
                branches,
                else_body,
            },
            span,
        })
    }

    /// Simple statements end with ';', end of line, or end of block.
    /// A ';' may also chain further statements on the same line.
    fn end_of_simple_stmt(&mut self, context: &str) -> PResult<()> {
        if self.skip(&TokenKind::Semicolon) {
            return Ok(());
        }
        if matches!(
            self.current().kind,
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
        ) {
            return Ok(());
        }
        Err(self.unexpected("';' or end of line", context))
    }
}

#[cfg(test)]
mod tests {
    use super::super::ast::{AttrRole, BlockKind, ClassKind, Module, StmtKind};
    use super::super::parse_module;
    use crate::frontend::error::{Diagnostic, ErrorCode};
    use crate::frontend::lexer::tokenize;

    fn module(source: &str) -> Module {
        let tokens = tokenize(source).expect("lexing failed");
        parse_module(&tokens, "test").expect("parsing failed")
    }

    fn parse_err(source: &str) -> Diagnostic {
        let tokens = tokenize(source).expect("lexing failed");
        parse_module(&tokens, "test").expect_err("parsing should have failed")
    }

    #[test]
    fn test_class_with_data_and_functions() {
        let src = "\
model Tank:
    data V, h: Real
    data A_bott: Real param

    func init():
        V := 0;
        A_bott := 1;

    func dynamic():
        $V := q - sqrt(2*g*h)*A_o
";
        let m = module(src);
        assert_eq!(m.classes.len(), 1);
        let c = &m.classes[0];
        assert_eq!(c.name, "Tank");
        assert_eq!(c.kind, ClassKind::Model);
        assert!(c.base.is_none());
        assert_eq!(c.data.len(), 2);
        assert_eq!(c.data[0].names.len(), 2);
        assert_eq!(c.data[0].type_name, "Real");
        assert_eq!(c.data[0].role, AttrRole::Variable);
        assert_eq!(c.data[1].role, AttrRole::Param);
        assert_eq!(c.funcs.len(), 2);
        assert_eq!(c.funcs[0].kind, BlockKind::Init);
        assert_eq!(c.funcs[1].kind, BlockKind::Dynamic);
        match &c.funcs[1].body[0].kind {
            StmtKind::Assign { differential, .. } => assert!(differential),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_inheritance_and_compile_directive() {
        let src = "\
class Base:
    data g: Real const

process RunTest(Base):
    data m: Real

compile RunTest
";
        let m = module(src);
        assert_eq!(m.classes.len(), 2);
        assert_eq!(m.classes[1].kind, ClassKind::Process);
        assert_eq!(m.classes[1].base.as_ref().unwrap().0, "Base");
        assert_eq!(m.compile_targets.len(), 1);
        assert_eq!(m.compile_targets[0].0, "RunTest");
    }

    #[test]
    fn test_inline_suite_and_semicolons() {
        let src = "class A:\n    func init(): x := 1; y = 2\n";
        let m = module(src);
        let body = &m.classes[0].funcs[0].body;
        assert_eq!(body.len(), 2);
        assert!(matches!(body[0].kind, StmtKind::Assign { .. }));
        assert!(matches!(body[1].kind, StmtKind::Assign { .. }));
    }

    #[test]
    fn test_single_line_class_body() {
        let m = module("class Empty: pass\n");
        let c = &m.classes[0];
        assert!(c.data.is_empty());
        assert!(c.funcs.is_empty());
    }

    #[test]
    fn test_if_elif_else() {
        let src = "\
class A:
    func dynamic():
        if h > 1:
            q := 0
        elif h > 0:
            q := 1
        else:
            q := 2
";
        let m = module(src);
        match &m.classes[0].funcs[0].body[0].kind {
            StmtKind::If {
                branches,
                else_body,
            } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(else_body.as_ref().unwrap().len(), 1);
            }
            other => panic!("expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_if_statement_span_covers_all_branches() {
        let src = "\
class A:
    func dynamic():
        if h > 1:
            q := 0
        else:
            q := 2
";
        let m = module(src);
        let stmt = &m.classes[0].funcs[0].body[0];
        assert_eq!(stmt.span.start.line, 3);
        assert_eq!(stmt.span.end.line, 6);
    }

    #[test]
    fn test_block_definition_and_call() {
        let src = "\
class A:
    block helper:
        x := 1

    func dynamic():
        helper()
";
        let m = module(src);
        let c = &m.classes[0];
        assert_eq!(c.funcs[0].name, "helper");
        assert_eq!(c.funcs[0].kind, BlockKind::User);
        assert!(c.funcs[0].params.is_empty());
        assert!(matches!(
            c.funcs[1].body[0].kind,
            StmtKind::Call { .. }
        ));
    }

    #[test]
    fn test_pragma_options() {
        let m = module("class Real: pragma no_flatten built_in_type\n");
        let p = &m.classes[0].pragmas;
        assert!(p.no_flatten);
        assert!(p.built_in_type);
    }

    #[test]
    fn test_dotted_assignment_target() {
        let src = "class A:\n    func init(): tank.h := 2.5\n";
        let m = module(src);
        match &m.classes[0].funcs[0].body[0].kind {
            StmtKind::Assign { target, .. } => {
                assert_eq!(target.dotted(), "tank.h");
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_error_in_data_definition() {
        let err = parse_err("class A:\n    data x Real\n");
        assert_eq!(err.code, ErrorCode::SyntaxError);
        assert_eq!(err.context.as_deref(), Some("data definition"));
    }

    #[test]
    fn test_error_bare_expression_statement() {
        let err = parse_err("class A:\n    func init():\n        x + 1\n");
        assert_eq!(err.code, ErrorCode::SyntaxError);
        assert!(err.message.contains("':=' or '('"));
    }

    #[test]
    fn test_error_at_module_level() {
        let err = parse_err("data x: Real\n");
        assert_eq!(err.code, ErrorCode::SyntaxError);
        assert_eq!(err.context.as_deref(), Some("module"));
    }

    #[test]
    fn test_error_empty_suite() {
        let err = parse_err("class A:\n    func init():\n    func dynamic(): pass\n");
        assert_eq!(err.code, ErrorCode::SyntaxError);
        assert_eq!(err.context.as_deref(), Some("function definition"));
    }
}
