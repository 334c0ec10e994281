//! Recursive descent parser for the Tarn specification language.
//!
//! Parsing is all-or-nothing: the first error aborts with the failing
//! token's position and there is no partial-program recovery.

use crate::ast::*;
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};
use thiserror::Error;

/// Parser error.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected token at {span}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("unexpected end of input at {span}")]
    UnexpectedEof { span: Span },
}

impl ParseError {
    /// Get the source span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span } => *span,
        }
    }

    /// Render the standard one-line diagnostic:
    /// `<file>:<line>:<col>: syntax error near <token-or-EOF>`.
    pub fn render(&self, file: &str) -> String {
        let span = self.span();
        let near = match self {
            ParseError::UnexpectedToken { found, .. } => found.as_str(),
            ParseError::UnexpectedEof { .. } => "EOF",
        };
        format!(
            "{}:{}:{}: syntax error near {}",
            file, span.line, span.column, near
        )
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parser for Tarn source code.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from source text.
    pub fn new(source: &str) -> Self {
        Self {
            tokens: Lexer::new(source).tokenize(),
            pos: 0,
        }
    }

    /// Parse a complete program: a flat sequence of declarations.
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut decls = Vec::new();
        while !self.is_at_end() {
            decls.push(self.parse_decl()?);
        }
        Ok(Program::new(decls))
    }

    // === Declarations ===

    fn parse_decl(&mut self) -> ParseResult<Decl> {
        match self.peek_kind() {
            TokenKind::Sort => self.parse_sort_decl().map(Decl::Sort),
            TokenKind::Mutable | TokenKind::Immutable => self.parse_state_decl(),
            TokenKind::Derived => self.parse_derived_relation_decl().map(Decl::Relation),
            TokenKind::Axiom => self.parse_axiom_decl().map(Decl::Axiom),
            TokenKind::Init => self.parse_init_decl().map(Decl::Init),
            TokenKind::Safety | TokenKind::Invariant | TokenKind::Sketch => {
                self.parse_invariant_decl().map(Decl::Invariant)
            }
            TokenKind::Transition => self.parse_transition_decl().map(Decl::Transition),
            TokenKind::Onestate | TokenKind::Twostate | TokenKind::Theorem => {
                self.parse_theorem_decl().map(Decl::Theorem)
            }
            TokenKind::Automaton => self.parse_automaton_decl().map(Decl::Automaton),
            _ => Err(self.unexpected("a declaration")),
        }
    }

    fn parse_sort_decl(&mut self) -> ParseResult<SortDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Sort)?;
        let name = self.parse_ident()?;
        let span = start.merge(self.prev_span());
        Ok(SortDecl { name, span })
    }

    /// Parse `mutable|immutable relation|constant|function ...`.
    fn parse_state_decl(&mut self) -> ParseResult<Decl> {
        let start = self.current_span();
        let mutable = match self.peek_kind() {
            TokenKind::Mutable => true,
            TokenKind::Immutable => false,
            _ => return Err(self.unexpected("mutable or immutable")),
        };
        self.advance();

        match self.peek_kind() {
            TokenKind::Relation => {
                self.advance();
                let name = self.parse_ident()?;
                let arity = self.parse_arity()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::Relation(RelationDecl {
                    name,
                    arity,
                    mutable,
                    derived: None,
                    span,
                }))
            }
            TokenKind::Constant => {
                self.advance();
                let name = self.parse_ident()?;
                self.expect(TokenKind::Colon)?;
                let sort = self.parse_sort()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::Constant(ConstantDecl {
                    name,
                    sort,
                    mutable,
                    span,
                }))
            }
            TokenKind::Function => {
                self.advance();
                let name = self.parse_ident()?;
                self.expect(TokenKind::LParen)?;
                let arity = self.parse_sort_list()?;
                self.expect(TokenKind::RParen)?;
                self.expect(TokenKind::Colon)?;
                let sort = self.parse_sort()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::Function(FunctionDecl {
                    name,
                    arity,
                    sort,
                    mutable,
                    span,
                }))
            }
            _ => Err(self.unexpected("relation, constant, or function")),
        }
    }

    /// Parse `derived relation NAME(arity): expr`. Derived relations
    /// are stored as mutable, like the rest of the relation namespace.
    fn parse_derived_relation_decl(&mut self) -> ParseResult<RelationDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Derived)?;
        self.expect(TokenKind::Relation)?;
        let name = self.parse_ident()?;
        let arity = self.parse_arity()?;
        self.expect(TokenKind::Colon)?;
        let expr = self.parse_expr()?;
        let span = start.merge(self.prev_span());
        Ok(RelationDecl {
            name,
            arity,
            mutable: true,
            derived: Some(expr),
            span,
        })
    }

    /// Parse an optional arity: nothing, `()`, or `(sort, ...)`.
    fn parse_arity(&mut self) -> ParseResult<Vec<SortRef>> {
        if !self.match_token(TokenKind::LParen) {
            return Ok(Vec::new());
        }
        if self.match_token(TokenKind::RParen) {
            return Ok(Vec::new());
        }
        let sorts = self.parse_sort_list()?;
        self.expect(TokenKind::RParen)?;
        Ok(sorts)
    }

    /// Parse one or more comma-separated sorts.
    fn parse_sort_list(&mut self) -> ParseResult<Vec<SortRef>> {
        let mut sorts = vec![self.parse_sort()?];
        while self.match_token(TokenKind::Comma) {
            sorts.push(self.parse_sort()?);
        }
        Ok(sorts)
    }

    fn parse_sort(&mut self) -> ParseResult<SortRef> {
        let span = self.current_span();
        let name = self.parse_ident()?;
        Ok(SortRef::new(name.name, span))
    }

    fn parse_axiom_decl(&mut self) -> ParseResult<AxiomDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Axiom)?;
        let name = self.parse_opt_name()?;
        let expr = self.parse_expr()?;
        let span = start.merge(self.prev_span());
        Ok(AxiomDecl { name, expr, span })
    }

    fn parse_init_decl(&mut self) -> ParseResult<InitDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Init)?;
        let name = self.parse_opt_name()?;
        let expr = self.parse_expr()?;
        let span = start.merge(self.prev_span());
        Ok(InitDecl { name, expr, span })
    }

    /// Parse `safety|invariant|sketch invariant [NAME] expr`. Shared
    /// between top-level declarations and phase components.
    fn parse_invariant_decl(&mut self) -> ParseResult<InvariantDecl> {
        let start = self.current_span();
        let (is_safety, is_sketch) = match self.peek_kind() {
            TokenKind::Safety => {
                self.advance();
                (true, false)
            }
            TokenKind::Sketch => {
                self.advance();
                self.expect(TokenKind::Invariant)?;
                (false, true)
            }
            TokenKind::Invariant => {
                self.advance();
                (false, false)
            }
            _ => return Err(self.unexpected("safety, invariant, or sketch invariant")),
        };
        let name = self.parse_opt_name()?;
        let expr = self.parse_expr()?;
        let span = start.merge(self.prev_span());
        Ok(InvariantDecl {
            name,
            expr,
            is_safety,
            is_sketch,
            span,
        })
    }

    /// Parse an optional bracketed name: `[NAME]`.
    fn parse_opt_name(&mut self) -> ParseResult<Option<String>> {
        if !self.match_token(TokenKind::LBracket) {
            return Ok(None);
        }
        let name = self.parse_ident()?;
        self.expect(TokenKind::RBracket)?;
        Ok(Some(name.name))
    }

    fn parse_transition_decl(&mut self) -> ParseResult<TransitionDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Transition)?;
        let name = self.parse_ident()?;
        self.expect(TokenKind::LParen)?;
        let params = if self.check(TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_sorted_vars()?
        };
        self.expect(TokenKind::RParen)?;

        let body = match self.peek_kind() {
            TokenKind::Modifies => {
                self.advance();
                let mut mods = vec![ModifiesClause {
                    name: self.parse_ident()?,
                }];
                while self.match_token(TokenKind::Comma) {
                    mods.push(ModifiesClause {
                        name: self.parse_ident()?,
                    });
                }
                let expr = self.parse_expr()?;
                TransitionBody::Relation { mods, expr }
            }
            TokenKind::LBrace => TransitionBody::Block(self.parse_block()?),
            _ => return Err(self.unexpected("modifies or a statement block")),
        };

        let span = start.merge(self.prev_span());
        Ok(TransitionDecl {
            name,
            params,
            body,
            span,
        })
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        let start = self.current_span();
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        let span = start.merge(self.prev_span());
        Ok(Block { stmts, span })
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        if self.match_token(TokenKind::Assume) {
            let expr = self.parse_expr()?;
            self.expect(TokenKind::Semi)?;
            let span = start.merge(self.prev_span());
            return Ok(Stmt::Assume(AssumeStmt { expr, span }));
        }

        let target = self.parse_ident()?;
        let args = if self.match_token(TokenKind::LParen) {
            let args = self.parse_args()?;
            self.expect(TokenKind::RParen)?;
            args
        } else {
            Vec::new()
        };
        self.expect(TokenKind::ColonEquals)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semi)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Assign(AssignStmt {
            target,
            args,
            value,
            span,
        }))
    }

    fn parse_theorem_decl(&mut self) -> ParseResult<TheoremDecl> {
        let start = self.current_span();
        let is_twostate = match self.peek_kind() {
            TokenKind::Onestate => {
                self.advance();
                false
            }
            TokenKind::Twostate => {
                self.advance();
                true
            }
            _ => false,
        };
        self.expect(TokenKind::Theorem)?;
        let name = self.parse_opt_name()?;
        let expr = self.parse_expr()?;
        let span = start.merge(self.prev_span());
        Ok(TheoremDecl {
            name,
            expr,
            is_twostate,
            span,
        })
    }

    // === Automaton declarations ===

    fn parse_automaton_decl(&mut self) -> ParseResult<AutomatonDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Automaton)?;
        self.expect(TokenKind::LBrace)?;

        let mut components = Vec::new();
        while !self.check(TokenKind::RBrace) {
            components.push(self.parse_automaton_component()?);
        }

        self.expect(TokenKind::RBrace)?;
        let span = start.merge(self.prev_span());
        Ok(AutomatonDecl { components, span })
    }

    fn parse_automaton_component(&mut self) -> ParseResult<AutomatonComponent> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::Global => {
                self.advance();
                let components = self.parse_phase_components()?;
                let span = start.merge(self.prev_span());
                Ok(AutomatonComponent::Global(GlobalPhaseDecl {
                    components,
                    span,
                }))
            }
            TokenKind::Init => {
                self.advance();
                self.expect(TokenKind::Phase)?;
                let phase = self.parse_ident()?;
                let span = start.merge(self.prev_span());
                Ok(AutomatonComponent::InitPhase(InitPhaseDecl { phase, span }))
            }
            TokenKind::Phase => {
                self.advance();
                let name = self.parse_ident()?;
                let components = self.parse_phase_components()?;
                let span = start.merge(self.prev_span());
                Ok(AutomatonComponent::Phase(PhaseDecl {
                    name,
                    components,
                    span,
                }))
            }
            _ => Err(self.unexpected("global, init phase, or phase")),
        }
    }

    fn parse_phase_components(&mut self) -> ParseResult<Vec<PhaseComponent>> {
        let mut components = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Transition => {
                    components.push(PhaseComponent::Transition(self.parse_phase_transition()?));
                }
                TokenKind::Safety | TokenKind::Invariant | TokenKind::Sketch => {
                    components.push(PhaseComponent::Invariant(self.parse_invariant_decl()?));
                }
                _ => break,
            }
        }
        Ok(components)
    }

    /// Parse `transition NAME -> (self | phase NAME) [assume expr]`.
    fn parse_phase_transition(&mut self) -> ParseResult<PhaseTransitionDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Transition)?;
        let transition = self.parse_ident()?;
        self.expect(TokenKind::Implies)?;
        let target = if self.match_token(TokenKind::SelfKw) {
            None
        } else {
            self.expect(TokenKind::Phase)?;
            Some(self.parse_ident()?)
        };
        let guard = if self.match_token(TokenKind::Assume) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let span = start.merge(self.prev_span());
        Ok(PhaseTransitionDecl {
            transition,
            target,
            guard,
            span,
        })
    }

    // === Expressions ===
    //
    // Precedence, lowest to highest binding power:
    //   quantifier body (`.`)  <  `<->`  <  `->`  <  `|`  <  `&`
    //   <  `=` / `!=`  <  `!`
    // `<->` and `=`/`!=` are non-associative; `->` and `!` are
    // right-associative; `|` and `&` flatten into n-ary nodes.

    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_iff()
    }

    fn parse_iff(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_implies()?;
        if self.match_token(TokenKind::Iff) {
            let rhs = self.parse_implies()?;
            if self.check(TokenKind::Iff) {
                return Err(self.unexpected("an operand (<-> is non-associative)"));
            }
            let span = lhs.span.merge(rhs.span);
            return Ok(Expr::new(
                ExprKind::Binary {
                    op: BinOp::Iff,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            ));
        }
        Ok(lhs)
    }

    fn parse_implies(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_or()?;
        if self.match_token(TokenKind::Implies) {
            let rhs = self.parse_implies()?;
            let span = lhs.span.merge(rhs.span);
            return Ok(Expr::new(
                ExprKind::Binary {
                    op: BinOp::Implies,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            ));
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.match_token(TokenKind::Pipe) {
            let rhs = self.parse_and()?;
            lhs = Self::flatten_nary(NaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_eq()?;
        while self.match_token(TokenKind::Ampersand) {
            let rhs = self.parse_eq()?;
            lhs = Self::flatten_nary(NaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    /// Collapse repeated left-associated applications of the same n-ary
    /// operator into a single node holding all operands.
    fn flatten_nary(op: NaryOp, lhs: Expr, rhs: Expr) -> Expr {
        let span = lhs.span.merge(rhs.span);
        match lhs.kind {
            ExprKind::Nary { op: lop, mut args } if lop == op => {
                args.push(rhs);
                Expr::new(ExprKind::Nary { op, args }, span)
            }
            kind => Expr::new(
                ExprKind::Nary {
                    op,
                    args: vec![Expr::new(kind, lhs.span), rhs],
                },
                span,
            ),
        }
    }

    fn parse_eq(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_unary()?;
        let op = match self.peek_kind() {
            TokenKind::Equal => Some(BinOp::Equal),
            TokenKind::NotEq => Some(BinOp::NotEq),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.parse_unary()?;
            if matches!(self.peek_kind(), TokenKind::Equal | TokenKind::NotEq) {
                return Err(self.unexpected("an operand (= and != are non-associative)"));
            }
            let span = lhs.span.merge(rhs.span);
            return Ok(Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            ));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        if self.match_token(TokenKind::Bang) {
            let arg = self.parse_unary()?;
            let span = start.merge(arg.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    arg: Box::new(arg),
                },
                span,
            ));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::True => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), start))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), start))
            }
            TokenKind::Old => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let arg = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                let span = start.merge(self.prev_span());
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Old,
                        arg: Box::new(arg),
                    },
                    span,
                ))
            }
            TokenKind::Forall | TokenKind::Exists => self.parse_quantifier(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Ident(_) => {
                let callee = self.parse_ident()?;
                if self.match_token(TokenKind::LParen) {
                    let args = self.parse_args()?;
                    self.expect(TokenKind::RParen)?;
                    let span = start.merge(self.prev_span());
                    Ok(Expr::new(ExprKind::App { callee, args }, span))
                } else {
                    Ok(Expr::new(ExprKind::Id(callee.name), callee.span))
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Parse a quantifier. The body separator `.` has the lowest
    /// binding power, so the body extends maximally rightward.
    fn parse_quantifier(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let quant = match self.peek_kind() {
            TokenKind::Forall => Quant::Forall,
            TokenKind::Exists => Quant::Exists,
            _ => return Err(self.unexpected("forall or exists")),
        };
        self.advance();
        let vars = self.parse_sorted_vars()?;
        self.expect(TokenKind::Dot)?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Quantifier {
                quant,
                binder: Binder::new(vars),
                body: Box::new(body),
            },
            span,
        ))
    }

    /// Parse one or more comma-separated sorted variables, each
    /// `NAME` or `NAME: sort`.
    fn parse_sorted_vars(&mut self) -> ParseResult<Vec<SortedVar>> {
        let mut vars = vec![self.parse_sorted_var()?];
        while self.match_token(TokenKind::Comma) {
            vars.push(self.parse_sorted_var()?);
        }
        Ok(vars)
    }

    fn parse_sorted_var(&mut self) -> ParseResult<SortedVar> {
        let name = self.parse_ident()?;
        let sort = if self.match_token(TokenKind::Colon) {
            Some(self.parse_sort()?)
        } else {
            None
        };
        Ok(SortedVar { name, sort })
    }

    /// Parse a possibly empty comma-separated argument list.
    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check(TokenKind::RParen) {
            return Ok(args);
        }
        args.push(self.parse_expr()?);
        while self.match_token(TokenKind::Comma) {
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }

    // === Token helpers ===

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        let span = self.current_span();
        match self.peek_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(Ident::new(name, span))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("tokens end with EOF"))
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind.clone()
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::dummy()
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        std::mem::discriminant(&self.peek_kind()) == std::mem::discriminant(&kind)
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.check(kind.clone()) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        if self.is_at_end() {
            ParseError::UnexpectedEof {
                span: self.current_span(),
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.peek_kind().to_string(),
                span: self.current_span(),
            }
        }
    }
}

/// Parse source text into a program.
pub fn parse(source: &str) -> ParseResult<Program> {
    Parser::new(source).parse_program()
}

/// Parse a single expression, requiring the whole input be consumed.
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let mut parser = Parser::new(source);
    let expr = parser.parse_expr()?;
    if !parser.is_at_end() {
        return Err(parser.unexpected("end of input"));
    }
    Ok(expr)
}
