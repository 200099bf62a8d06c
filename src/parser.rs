//! Recursive-descent parser with precedence climbing.
//!
//! Grammar, loosest to tightest: assignment → logical-or (`o`) →
//! logical-and (`y`) → equality → comparison → term → factor → unary →
//! call/postfix → primary. Every control-flow body is a braced block; there
//! is no single-statement-without-braces form.
//!
//! Parsing fails fast on the first error rather than trying to recover and
//! report several at once — `interpret`'s external contract only ever
//! surfaces one error per run, so recovery machinery would be
//! dead weight here.

use crate::ast::*;
use crate::error::{HispanoError, Result, kind_name};
use crate::lexer::Lexer;
use crate::token::{Interner, Literal as TokenLiteral, Span, Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    interner: &'a mut Interner,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, interner: &'a mut Interner) -> Self {
        Parser { tokens, current: 0, interner }
    }

    pub fn parse(mut self) -> Result<Program> {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            stmts.push(self.declaration()?);
        }
        Ok(stmts)
    }

    // ---- token cursor -----------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn match_token(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.iter().any(|k| self.check(*k)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek().clone();
            Err(HispanoError::UnexpectedToken {
                expected: expected.to_string(),
                found: kind_name(found.kind).to_string(),
                span: found.span,
            })
        }
    }

    fn text(&self, token: &Token) -> String {
        self.interner.resolve(token.lexeme).to_string()
    }

    fn identifier_name(&mut self) -> Result<String> {
        let token = self.consume(TokenKind::Identifier, "un identificador")?;
        Ok(self.text(&token))
    }

    // ---- declarations and statements ---------------------------------

    fn declaration(&mut self) -> Result<Stmt> {
        match self.peek().kind {
            TokenKind::Variable => self.variable_decl(),
            TokenKind::Constante => self.constant_decl(),
            TokenKind::Funcion => self.function_decl(),
            TokenKind::Clase => self.class_decl(),
            _ => self.statement(),
        }
    }

    fn variable_decl(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'variable'
        let name = self.identifier_name()?;
        let init = if self.match_token(&[TokenKind::Equal]) { Some(self.expression()?) } else { None };
        self.consume(TokenKind::Semicolon, "';' después de la declaración")?;
        Ok(Stmt::new(line, StmtKind::VariableDecl { name, init }))
    }

    fn constant_decl(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'constante'
        let name = self.identifier_name()?;
        self.consume(TokenKind::Equal, "'=' después del nombre de la constante")?;
        let init = self.expression()?;
        self.consume(TokenKind::Semicolon, "';' después de la declaración")?;
        Ok(Stmt::new(line, StmtKind::ConstantDecl { name, init }))
    }

    fn params_list(&mut self) -> Result<Vec<Param>> {
        self.consume(TokenKind::LeftParen, "'(' antes de los parámetros")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(Param { name: self.identifier_name()? });
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "')' después de los parámetros")?;
        Ok(params)
    }

    fn function_decl(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'funcion'
        let name = self.identifier_name()?;
        let params = self.params_list()?;
        let body = self.block()?;
        Ok(Stmt::new(line, StmtKind::FunctionDecl { name, params, body }))
    }

    fn class_decl(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'clase'
        let name = self.identifier_name()?;
        let superclass =
            if self.match_token(&[TokenKind::Extiende]) { Some(self.identifier_name()?) } else { None };
        self.consume(TokenKind::LeftBrace, "'{' antes del cuerpo de la clase")?;

        let mut constructor = None;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if self.check(TokenKind::Constructor) {
                self.advance();
                let params = self.params_list()?;
                let body = self.block()?;
                constructor = Some((params, body));
            } else {
                let method_name = self.identifier_name()?;
                let params = self.params_list()?;
                let body = self.block()?;
                methods.push(MethodDecl { name: method_name, params, body });
            }
        }
        self.consume(TokenKind::RightBrace, "'}' después del cuerpo de la clase")?;

        Ok(Stmt::new(line, StmtKind::ClassDecl(ClassDecl { name, superclass, constructor, methods })))
    }

    fn block(&mut self) -> Result<Block> {
        self.consume(TokenKind::LeftBrace, "'{' antes del bloque")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }
        self.consume(TokenKind::RightBrace, "'}' después del bloque")?;
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Stmt> {
        match self.peek().kind {
            TokenKind::Mostrar => self.print_stmt(),
            TokenKind::Leer => self.read_stmt(),
            TokenKind::Si => self.if_stmt(),
            TokenKind::Mientras => self.while_stmt(),
            TokenKind::Para => self.for_stmt(),
            TokenKind::Hacer => self.do_while_stmt(),
            TokenKind::Elegir => self.switch_stmt(),
            TokenKind::Intentar => self.try_catch_stmt(),
            TokenKind::Retornar => self.return_stmt(),
            TokenKind::Romper => self.break_stmt(),
            TokenKind::Continuar => self.continue_stmt(),
            TokenKind::LeftBrace => {
                let line = self.peek().line();
                Ok(Stmt::new(line, StmtKind::Block(self.block()?)))
            }
            _ => self.expression_stmt(),
        }
    }

    fn print_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'mostrar'
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "';' después de la expresión")?;
        Ok(Stmt::new(line, StmtKind::Print(expr)))
    }

    fn read_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'leer'
        let name = self.identifier_name()?;
        self.consume(TokenKind::Semicolon, "';' después de 'leer'")?;
        Ok(Stmt::new(line, StmtKind::Read { name }))
    }

    fn if_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'si'
        self.consume(TokenKind::LeftParen, "'(' después de 'si'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "')' después de la condición")?;
        let then_branch = self.block()?;
        let else_branch = if self.match_token(&[TokenKind::Sino]) {
            if self.check(TokenKind::Si) {
                Some(vec![self.if_stmt()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::new(line, StmtKind::If { cond, then_branch, else_branch }))
    }

    fn while_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'mientras'
        self.consume(TokenKind::LeftParen, "'(' después de 'mientras'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "')' después de la condición")?;
        let body = self.block()?;
        Ok(Stmt::new(line, StmtKind::While { cond, body }))
    }

    fn for_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'para'
        if self.match_token(&[TokenKind::Cada]) {
            let var = self.identifier_name()?;
            self.consume(TokenKind::En, "'en' después de la variable de 'para cada'")?;
            let iterable = self.expression()?;
            let body = self.block()?;
            return Ok(Stmt::new(line, StmtKind::ForEach { var, iterable, body }));
        }

        self.consume(TokenKind::LeftParen, "'(' después de 'para'")?;
        let init = if self.check(TokenKind::Semicolon) {
            self.advance();
            None
        } else if self.check(TokenKind::Variable) {
            Some(Box::new(self.variable_decl()?))
        } else {
            Some(Box::new(self.expression_stmt()?))
        };
        let cond = if self.check(TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        self.consume(TokenKind::Semicolon, "';' después de la condición")?;
        let step = if self.check(TokenKind::RightParen) { None } else { Some(self.expression()?) };
        self.consume(TokenKind::RightParen, "')' después del encabezado de 'para'")?;
        let body = self.block()?;
        Ok(Stmt::new(line, StmtKind::For { header: ForHeader { init, cond, step }, body }))
    }

    fn do_while_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'hacer'
        let body = self.block()?;
        self.consume(TokenKind::Mientras, "'mientras' después del cuerpo de 'hacer'")?;
        self.consume(TokenKind::LeftParen, "'(' después de 'mientras'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "')' después de la condición")?;
        self.consume(TokenKind::Semicolon, "';' después de 'hacer ... mientras'")?;
        Ok(Stmt::new(line, StmtKind::DoWhile { body, cond }))
    }

    fn switch_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'elegir'
        self.consume(TokenKind::LeftParen, "'(' después de 'elegir'")?;
        let discriminant = self.expression()?;
        self.consume(TokenKind::RightParen, "')' después de la expresión de 'elegir'")?;
        self.consume(TokenKind::LeftBrace, "'{' antes de los casos")?;

        let mut cases = Vec::new();
        let mut default = None;
        loop {
            if self.check(TokenKind::Caso) {
                self.advance();
                let test = self.expression()?;
                self.consume(TokenKind::Colon, "':' después de 'caso'")?;
                let mut body = Vec::new();
                while !self.check(TokenKind::Caso)
                    && !self.check(TokenKind::PorDefecto)
                    && !self.check(TokenKind::RightBrace)
                    && !self.is_at_end()
                {
                    body.push(self.declaration()?);
                }
                cases.push(SwitchCase { test, body });
            } else if self.check(TokenKind::PorDefecto) {
                self.advance();
                self.consume(TokenKind::Colon, "':' después de 'pordefecto'")?;
                let mut body = Vec::new();
                while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
                    body.push(self.declaration()?);
                }
                default = Some(body);
            } else {
                break;
            }
        }
        self.consume(TokenKind::RightBrace, "'}' después de los casos de 'elegir'")?;
        Ok(Stmt::new(line, StmtKind::Switch { discriminant, cases, default }))
    }

    fn try_catch_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'intentar'
        let try_block = self.block()?;
        self.consume(TokenKind::Capturar, "'capturar' después del bloque de 'intentar'")?;
        self.consume(TokenKind::LeftParen, "'(' después de 'capturar'")?;
        let catch_var = self.identifier_name()?;
        self.consume(TokenKind::RightParen, "')' después de la variable de captura")?;
        let catch_block = self.block()?;
        Ok(Stmt::new(line, StmtKind::TryCatch { try_block, catch_var, catch_block }))
    }

    fn return_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance(); // 'retornar'
        let value = if self.check(TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        self.consume(TokenKind::Semicolon, "';' después de 'retornar'")?;
        Ok(Stmt::new(line, StmtKind::Return(value)))
    }

    fn break_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance();
        self.consume(TokenKind::Semicolon, "';' después de 'romper'")?;
        Ok(Stmt::new(line, StmtKind::Break))
    }

    fn continue_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        self.advance();
        self.consume(TokenKind::Semicolon, "';' después de 'continuar'")?;
        Ok(Stmt::new(line, StmtKind::Continue))
    }

    fn expression_stmt(&mut self) -> Result<Stmt> {
        let line = self.peek().line();
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "';' después de la expresión")?;
        Ok(Stmt::new(line, StmtKind::ExpressionStatement(expr)))
    }

    // ---- expressions --------------------------------------------------

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.logical_or()?;

        if self.match_token(&[TokenKind::Equal]) {
            let span = self.previous().span;
            let value = self.assignment()?;
            return self.build_assign(expr, value, span);
        }

        if let Some(op) = self.match_compound_op() {
            let span = self.previous().span;
            let value = self.assignment()?;
            let target = self.to_lvalue(expr, span)?;
            return Ok(Expr::CompoundAssign { target, op, value: Box::new(value) });
        }

        Ok(expr)
    }

    fn match_compound_op(&mut self) -> Option<AssignOp> {
        let op = match self.peek().kind {
            TokenKind::PlusEqual => AssignOp::Add,
            TokenKind::MinusEqual => AssignOp::Sub,
            TokenKind::StarEqual => AssignOp::Mul,
            TokenKind::SlashEqual => AssignOp::Div,
            TokenKind::PercentEqual => AssignOp::Mod,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn to_lvalue(&self, expr: Expr, span: Span) -> Result<LValue> {
        match expr {
            Expr::Variable(name) => Ok(LValue::Variable(name)),
            Expr::ArrayAccess { array, index } => Ok(LValue::ArrayElement { array, index }),
            Expr::PropertyAccess { object, name } => Ok(LValue::Property { object, name }),
            Expr::ThisPropertyAccess { name } => Ok(LValue::ThisProperty { name }),
            _ => Err(HispanoError::InvalidAssignmentTarget { span }),
        }
    }

    fn build_assign(&self, target: Expr, value: Expr, span: Span) -> Result<Expr> {
        match target {
            Expr::Variable(name) => Ok(Expr::Assign { name, value: Box::new(value) }),
            Expr::ArrayAccess { array, index } => {
                Ok(Expr::ArrayAssign { array, index, value: Box::new(value) })
            }
            Expr::PropertyAccess { object, name } => {
                Ok(Expr::PropertyAssign { object, name, value: Box::new(value) })
            }
            Expr::ThisPropertyAccess { name } => {
                Ok(Expr::ThisPropertyAssign { name, value: Box::new(value) })
            }
            _ => Err(HispanoError::InvalidAssignmentTarget { span }),
        }
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut left = self.logical_and()?;
        while self.match_token(&[TokenKind::O]) {
            let right = self.logical_and()?;
            left = Expr::Logical { op: LogicalOp::Or, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut left = self.equality()?;
        while self.match_token(&[TokenKind::Y]) {
            let right = self.equality()?;
            left = Expr::Logical { op: LogicalOp::And, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::BangEqual => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.comparison()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::LessEqual => BinaryOp::LtEq,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::GreaterEqual => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.match_token(&[TokenKind::Minus]) {
            let operand = self.unary()?;
            return Ok(Expr::Unary { op: UnaryOp::Negate, operand: Box::new(operand) });
        }
        if self.match_token(&[TokenKind::Bang]) {
            let operand = self.unary()?;
            return Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) });
        }
        if self.match_token(&[TokenKind::PlusPlus]) {
            let span = self.previous().span;
            let operand = self.unary()?;
            let target = self.to_lvalue(operand, span)?;
            return Ok(Expr::Prefix { op: IncDec::Inc, target });
        }
        if self.match_token(&[TokenKind::MinusMinus]) {
            let span = self.previous().span;
            let operand = self.unary()?;
            let target = self.to_lvalue(operand, span)?;
            return Ok(Expr::Prefix { op: IncDec::Dec, target });
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.match_token(&[TokenKind::LeftParen]) {
                let args = self.arguments()?;
                expr = Expr::Call { callee: Box::new(expr), args };
            } else if self.match_token(&[TokenKind::Dot]) {
                let name = self.identifier_name()?;
                if self.match_token(&[TokenKind::LeftParen]) {
                    let args = self.arguments()?;
                    expr = match expr {
                        Expr::This => Expr::ThisMethodCall { name, args },
                        other => Expr::MethodCall { receiver: Box::new(other), name, args },
                    };
                } else {
                    expr = match expr {
                        Expr::This => Expr::ThisPropertyAccess { name },
                        other => Expr::PropertyAccess { object: Box::new(other), name },
                    };
                }
            } else if self.match_token(&[TokenKind::LeftBracket]) {
                let index = self.expression()?;
                self.consume(TokenKind::RightBracket, "']' después del índice")?;
                expr = Expr::ArrayAccess { array: Box::new(expr), index: Box::new(index) };
            } else {
                break;
            }
        }

        if self.match_token(&[TokenKind::PlusPlus]) {
            let span = self.previous().span;
            let target = self.to_lvalue(expr, span)?;
            expr = Expr::Postfix { op: IncDec::Inc, target };
        } else if self.match_token(&[TokenKind::MinusMinus]) {
            let span = self.previous().span;
            let target = self.to_lvalue(expr, span)?;
            expr = Expr::Postfix { op: IncDec::Dec, target };
        }

        Ok(expr)
    }

    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "')' después de los argumentos")?;
        Ok(args)
    }

    /// Tries to read `(a, b)` immediately followed by `=>`, backtracking if
    /// the lookahead doesn't line up — the only way to tell an arrow
    /// function's parameter list apart from a parenthesized expression.
    fn try_parse_arrow_params(&mut self) -> Option<Vec<Param>> {
        let checkpoint = self.current;
        if !self.check(TokenKind::LeftParen) {
            return None;
        }
        self.advance();
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if !self.check(TokenKind::Identifier) {
                    self.current = checkpoint;
                    return None;
                }
                let token = self.advance();
                params.push(Param { name: self.text(&token) });
                if self.match_token(&[TokenKind::Comma]) {
                    continue;
                }
                break;
            }
        }
        if !self.match_token(&[TokenKind::RightParen]) {
            self.current = checkpoint;
            return None;
        }
        if !self.check(TokenKind::FatArrow) {
            self.current = checkpoint;
            return None;
        }
        Some(params)
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.peek().kind {
            TokenKind::Number => {
                let token = self.advance();
                match token.literal {
                    Some(TokenLiteral::Number(n)) => Ok(Expr::Literal(Literal::Number(n))),
                    _ => unreachable!("number token always carries a numeric literal"),
                }
            }
            TokenKind::String => {
                let token = self.advance();
                match token.literal {
                    Some(TokenLiteral::String(s)) => Ok(Expr::Literal(Literal::String(s))),
                    _ => unreachable!("string token always carries a string literal"),
                }
            }
            TokenKind::TemplateString => self.template_string(),
            TokenKind::Verdadero => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            TokenKind::Falso => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            TokenKind::Nulo => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Indefinido => {
                self.advance();
                Ok(Expr::Literal(Literal::Undefined))
            }
            TokenKind::Este => {
                self.advance();
                Ok(Expr::This)
            }
            TokenKind::Super => {
                self.advance();
                self.consume(TokenKind::LeftParen, "'(' después de 'super'")?;
                let args = self.arguments()?;
                Ok(Expr::SuperCall { args })
            }
            TokenKind::Nuevo => {
                self.advance();
                let class_name = self.identifier_name()?;
                self.consume(TokenKind::LeftParen, "'(' después del nombre de la clase")?;
                let args = self.arguments()?;
                Ok(Expr::New { class_name, args })
            }
            TokenKind::Funcion => {
                self.advance();
                let params = self.params_list()?;
                let body = self.block()?;
                Ok(Expr::AnonymousFunction { params, body })
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(Expr::Variable(self.text(&token)))
            }
            TokenKind::LeftBracket => self.array_literal(),
            TokenKind::LeftBrace => self.object_literal(),
            TokenKind::LeftParen => {
                if let Some(params) = self.try_parse_arrow_params() {
                    self.advance(); // '=>'
                    let body = if self.check(TokenKind::LeftBrace) {
                        ArrowBody::Block(self.block()?)
                    } else {
                        ArrowBody::Expression(Box::new(self.assignment()?))
                    };
                    return Ok(Expr::ArrowFunction { params, body });
                }
                self.advance(); // '('
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "')' después de la expresión")?;
                Ok(expr)
            }
            _ => {
                let found = self.peek().clone();
                Err(HispanoError::UnexpectedToken {
                    expected: "una expresión".to_string(),
                    found: kind_name(found.kind).to_string(),
                    span: found.span,
                })
            }
        }
    }

    fn array_literal(&mut self) -> Result<Expr> {
        self.advance(); // '['
        let mut items = Vec::new();
        if !self.check(TokenKind::RightBracket) {
            loop {
                items.push(self.expression()?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
                if self.check(TokenKind::RightBracket) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightBracket, "']' después de los elementos del arreglo")?;
        Ok(Expr::ArrayLiteral(items))
    }

    fn object_literal(&mut self) -> Result<Expr> {
        self.advance(); // '{'
        let mut fields = Vec::new();
        if !self.check(TokenKind::RightBrace) {
            loop {
                let key = if self.check(TokenKind::Identifier) {
                    let token = self.advance();
                    self.text(&token)
                } else if self.check(TokenKind::String) {
                    let token = self.advance();
                    match token.literal {
                        Some(TokenLiteral::String(s)) => s,
                        _ => unreachable!("string token always carries a string literal"),
                    }
                } else {
                    let found = self.peek().clone();
                    return Err(HispanoError::UnexpectedToken {
                        expected: "una clave de objeto".to_string(),
                        found: kind_name(found.kind).to_string(),
                        span: found.span,
                    });
                };
                self.consume(TokenKind::Colon, "':' después de la clave")?;
                let value = self.expression()?;
                fields.push((key, value));
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
                if self.check(TokenKind::RightBrace) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightBrace, "'}' después de los campos del objeto")?;
        Ok(Expr::ObjectLiteral(fields))
    }

    /// Re-lexes and re-parses each `${ ... }` expression captured by the
    /// lexer at parse time, not at evaluation time.
    fn template_string(&mut self) -> Result<Expr> {
        let token = self.advance();
        let payload = match token.literal {
            Some(TokenLiteral::Template(payload)) => payload,
            _ => unreachable!("template-string token always carries a template payload"),
        };
        let mut expressions = Vec::with_capacity(payload.expressions.len());
        for src in &payload.expressions {
            let sub_lexer = Lexer::new(src, self.interner);
            let sub_tokens = sub_lexer.tokenize()?;
            let sub_parser = Parser::new(sub_tokens, self.interner);
            let mut sub_parser = sub_parser;
            expressions.push(sub_parser.expression()?);
        }
        Ok(Expr::TemplateString { parts: payload.parts, expressions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program> {
        let mut interner = Interner::new();
        let lexer = Lexer::new(source, &mut interner);
        let tokens = lexer.tokenize()?;
        Parser::new(tokens, &mut interner).parse()
    }

    #[test]
    fn parses_variable_declaration_with_initializer() {
        let program = parse("variable a = 10;").unwrap();
        assert_eq!(program.len(), 1);
        match &program[0].kind {
            StmtKind::VariableDecl { name, init } => {
                assert_eq!(name, "a");
                assert!(init.is_some());
            }
            other => panic!("expected VariableDecl, got {other:?}"),
        }
    }

    #[test]
    fn parses_if_else_if_chain() {
        let program = parse("si (a > 1) { mostrar 1; } sino si (a > 0) { mostrar 0; } sino { mostrar -1; }").unwrap();
        match &program[0].kind {
            StmtKind::If { else_branch, .. } => {
                let branch = else_branch.as_ref().unwrap();
                assert_eq!(branch.len(), 1);
                assert!(matches!(branch[0].kind, StmtKind::If { .. }));
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_call() {
        let program = parse("sumar(1, 2);").unwrap();
        match &program[0].kind {
            StmtKind::ExpressionStatement(Expr::Call { args, .. }) => assert_eq!(args.len(), 2),
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn parses_array_and_index_access() {
        let program = parse("variable a = [1, 2, 3]; variable b = a[0];").unwrap();
        assert_eq!(program.len(), 2);
        match &program[1].kind {
            StmtKind::VariableDecl { init: Some(Expr::ArrayAccess { .. }), .. } => {}
            other => panic!("expected ArrayAccess, got {other:?}"),
        }
    }

    #[test]
    fn parses_object_literal() {
        let program = parse("variable o = {nombre: \"Ana\", edad: 30};").unwrap();
        match &program[0].kind {
            StmtKind::VariableDecl { init: Some(Expr::ObjectLiteral(fields)), .. } => {
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected ObjectLiteral, got {other:?}"),
        }
    }

    #[test]
    fn parses_compound_assignment() {
        let program = parse("variable a = 1; a += 2;").unwrap();
        match &program[1].kind {
            StmtKind::ExpressionStatement(Expr::CompoundAssign { op: AssignOp::Add, .. }) => {}
            other => panic!("expected CompoundAssign, got {other:?}"),
        }
    }

    #[test]
    fn parses_postfix_increment() {
        let program = parse("variable a = 1; a++;").unwrap();
        match &program[1].kind {
            StmtKind::ExpressionStatement(Expr::Postfix { op: IncDec::Inc, .. }) => {}
            other => panic!("expected Postfix, got {other:?}"),
        }
    }

    #[test]
    fn parses_arrow_function_with_expression_body() {
        let program = parse("variable doble = (x) => x * 2;").unwrap();
        match &program[0].kind {
            StmtKind::VariableDecl { init: Some(Expr::ArrowFunction { body: ArrowBody::Expression(_), .. }), .. } => {}
            other => panic!("expected ArrowFunction, got {other:?}"),
        }
    }

    #[test]
    fn parenthesized_expression_is_not_confused_with_arrow_function() {
        let program = parse("variable a = (1 + 2) * 3;").unwrap();
        match &program[0].kind {
            StmtKind::VariableDecl { init: Some(Expr::Binary { op: BinaryOp::Mul, .. }), .. } => {}
            other => panic!("expected Binary, got {other:?}"),
        }
    }

    #[test]
    fn parses_class_with_constructor_and_method() {
        let program = parse(
            "clase Persona { constructor(nombre) { este.nombre = nombre; } saludar() { mostrar este.nombre; } }",
        )
        .unwrap();
        match &program[0].kind {
            StmtKind::ClassDecl(class) => {
                assert!(class.constructor.is_some());
                assert_eq!(class.methods.len(), 1);
            }
            other => panic!("expected ClassDecl, got {other:?}"),
        }
    }

    #[test]
    fn method_call_requires_immediate_parenthesis() {
        let program = parse("a.longitud; a.mapear(f);").unwrap();
        match &program[0].kind {
            StmtKind::ExpressionStatement(Expr::PropertyAccess { .. }) => {}
            other => panic!("expected PropertyAccess, got {other:?}"),
        }
        match &program[1].kind {
            StmtKind::ExpressionStatement(Expr::MethodCall { name, .. }) => assert_eq!(name, "mapear"),
            other => panic!("expected MethodCall, got {other:?}"),
        }
    }

    #[test]
    fn invalid_assignment_target_is_an_error() {
        let result = parse("1 + 1 = 2;");
        assert!(matches!(result, Err(HispanoError::InvalidAssignmentTarget { .. })));
    }

    #[test]
    fn parses_template_string_expressions() {
        let program = parse("mostrar `Hola ${nombre}, tienes ${edad + 1} años`;").unwrap();
        match &program[0].kind {
            StmtKind::Print(Expr::TemplateString { parts, expressions }) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(expressions.len(), 2);
                assert!(matches!(expressions[0], Expr::Variable(_)));
                assert!(matches!(expressions[1], Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected TemplateString, got {other:?}"),
        }
    }

    #[test]
    fn parses_for_each_loop() {
        let program = parse("para cada x en lista { mostrar x; }").unwrap();
        assert!(matches!(program[0].kind, StmtKind::ForEach { .. }));
    }

    #[test]
    fn parses_classic_for_loop() {
        let program = parse("para (variable i = 0; i < 10; i++) { mostrar i; }").unwrap();
        match &program[0].kind {
            StmtKind::For { header, .. } => {
                assert!(header.init.is_some());
                assert!(header.cond.is_some());
                assert!(header.step.is_some());
            }
            other => panic!("expected For, got {other:?}"),
        }
    }

    #[test]
    fn parses_switch_with_default() {
        let program = parse("elegir (x) { caso 1: mostrar \"uno\"; pordefecto: mostrar \"otro\"; }").unwrap();
        match &program[0].kind {
            StmtKind::Switch { cases, default, .. } => {
                assert_eq!(cases.len(), 1);
                assert!(default.is_some());
            }
            other => panic!("expected Switch, got {other:?}"),
        }
    }

    #[test]
    fn parses_try_catch() {
        let program = parse("intentar { mostrar 1/0; } capturar (e) { mostrar e; }").unwrap();
        assert!(matches!(program[0].kind, StmtKind::TryCatch { .. }));
    }
}
