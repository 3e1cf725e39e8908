//! Syntax-directed compiler for the Jack language
//!
//! Recursive-descent parser with no intermediate AST: every grammar
//! production emits VM code the moment it is recognized, consulting the
//! two-scope [`SymbolTable`] for variable/segment resolution and dispatching
//! subroutine calls (bound method / variable-typed method / static
//! fallback) at the call site.

use crate::symbol_table::{Kind, SymbolTable};
use crate::tokenizer::{Keyword, Token};
use crate::vm_writer::{ArithmeticCommand, Segment, VMWriter};
use std::fmt;
use std::io::Write;

#[derive(Debug)]
pub enum Error {
    /// Input ended mid-production.
    UnexpectedEof,
    /// The current token does not match what the grammar requires here.
    Expected { expected: String, found: String },
    /// A name was read in a position that requires it to resolve through
    /// the symbol table (a variable use, an array target, a `let` target),
    /// and it does not.
    UnknownIdentifier(String),
    VmWrite(crate::vm_writer::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::UnknownIdentifier(name) => write!(f, "unknown identifier: {name}"),
            Self::VmWrite(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<crate::vm_writer::Error> for Error {
    fn from(error: crate::vm_writer::Error) -> Self {
        Self::VmWrite(error)
    }
}

fn kind_to_segment(kind: Kind) -> Segment {
    match kind {
        Kind::Static => Segment::Static,
        Kind::Field => Segment::This,
        Kind::Arg => Segment::Argument,
        Kind::Var => Segment::Local,
    }
}

/// Drives a one-pass compile of a single class's tokens to VM code.
pub struct CompilationEngine<'a, W: Write> {
    tokens: &'a [Token],
    pos: usize,
    vm: VMWriter<W>,
    symbols: SymbolTable,
    class_name: String,
    label_counter: u32,
}

impl<'a, W: Write> CompilationEngine<'a, W> {
    #[must_use]
    pub fn new(tokens: &'a [Token], out: W) -> Self {
        Self {
            tokens,
            pos: 0,
            vm: VMWriter::new(out),
            symbols: SymbolTable::new(),
            class_name: String::new(),
            label_counter: 0,
        }
    }

    /// Compiles exactly one `class ... { ... }` declaration, the only
    /// top-level production in the grammar.
    ///
    /// # Errors
    /// Returns the first [`Error`] encountered.
    pub fn compile_class(mut self) -> Result<(), Error> {
        self.eat_keyword(Keyword::Class)?;
        self.class_name = self.eat_identifier()?;
        self.eat_symbol('{')?;

        while self.peek_is_keyword(Keyword::Static) || self.peek_is_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }

        while self.peek_is_keyword(Keyword::Constructor)
            || self.peek_is_keyword(Keyword::Function)
            || self.peek_is_keyword(Keyword::Method)
        {
            self.compile_subroutine()?;
        }

        self.eat_symbol('}')?;
        self.vm.flush().map_err(|e| Error::VmWrite(e.into()))?;
        Ok(())
    }

    fn compile_class_var_dec(&mut self) -> Result<(), Error> {
        let kind = match self.eat_any_keyword(&[Keyword::Static, Keyword::Field])? {
            Keyword::Static => Kind::Static,
            Keyword::Field => Kind::Field,
            _ => unreachable!(),
        };
        let var_type = self.eat_type()?;
        let name = self.eat_identifier()?;
        self.symbols.define(&name, &var_type, kind);

        while self.peek_is_symbol(',') {
            self.eat_symbol(',')?;
            let name = self.eat_identifier()?;
            self.symbols.define(&name, &var_type, kind);
        }
        self.eat_symbol(';')?;
        Ok(())
    }

    fn compile_subroutine(&mut self) -> Result<(), Error> {
        self.symbols.start_subroutine();
        self.label_counter = 0;

        let subroutine_kind =
            self.eat_any_keyword(&[Keyword::Constructor, Keyword::Function, Keyword::Method])?;

        // Return type: 'void' or a type; neither is semantically used.
        if self.peek_is_keyword(Keyword::Void) {
            self.eat_keyword(Keyword::Void)?;
        } else {
            self.eat_type()?;
        }

        let subroutine_name = self.eat_identifier()?;

        if subroutine_kind == Keyword::Method {
            self.symbols.define("this", &self.class_name.clone(), Kind::Arg);
        }

        self.eat_symbol('(')?;
        self.compile_parameter_list()?;
        self.eat_symbol(')')?;

        self.eat_symbol('{')?;
        while self.peek_is_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        let n_locals = self.symbols.var_count(Kind::Var);
        self.vm
            .write_function(&format!("{}.{subroutine_name}", self.class_name), n_locals)?;

        match subroutine_kind {
            Keyword::Constructor => {
                let n_fields = self.symbols.var_count(Kind::Field);
                self.vm.write_push(Segment::Constant, n_fields)?;
                self.vm.write_call("Memory.alloc", 1)?;
                self.vm.write_pop(Segment::Pointer, 0)?;
            }
            Keyword::Method => {
                self.vm.write_push(Segment::Argument, 0)?;
                self.vm.write_pop(Segment::Pointer, 0)?;
            }
            Keyword::Function => {}
            _ => unreachable!(),
        }

        self.compile_statements()?;
        self.eat_symbol('}')?;
        Ok(())
    }

    fn compile_parameter_list(&mut self) -> Result<(), Error> {
        if !self.peek_is_symbol(')') {
            let var_type = self.eat_type()?;
            let name = self.eat_identifier()?;
            self.symbols.define(&name, &var_type, Kind::Arg);

            while self.peek_is_symbol(',') {
                self.eat_symbol(',')?;
                let var_type = self.eat_type()?;
                let name = self.eat_identifier()?;
                self.symbols.define(&name, &var_type, Kind::Arg);
            }
        }
        Ok(())
    }

    fn compile_var_dec(&mut self) -> Result<(), Error> {
        self.eat_keyword(Keyword::Var)?;
        let var_type = self.eat_type()?;
        let name = self.eat_identifier()?;
        self.symbols.define(&name, &var_type, Kind::Var);

        while self.peek_is_symbol(',') {
            self.eat_symbol(',')?;
            let name = self.eat_identifier()?;
            self.symbols.define(&name, &var_type, Kind::Var);
        }
        self.eat_symbol(';')?;
        Ok(())
    }

    fn compile_statements(&mut self) -> Result<(), Error> {
        loop {
            if self.peek_is_keyword(Keyword::Let) {
                self.compile_let()?;
            } else if self.peek_is_keyword(Keyword::If) {
                self.compile_if()?;
            } else if self.peek_is_keyword(Keyword::While) {
                self.compile_while()?;
            } else if self.peek_is_keyword(Keyword::Do) {
                self.compile_do()?;
            } else if self.peek_is_keyword(Keyword::Return) {
                self.compile_return()?;
            } else {
                return Ok(());
            }
        }
    }

    fn compile_do(&mut self) -> Result<(), Error> {
        self.eat_keyword(Keyword::Do)?;
        let name = self.eat_identifier()?;
        self.compile_subroutine_call(&name)?;
        self.eat_symbol(';')?;
        self.vm.write_pop(Segment::Temp, 0)?;
        Ok(())
    }

    fn compile_let(&mut self) -> Result<(), Error> {
        self.eat_keyword(Keyword::Let)?;
        let name = self.eat_identifier()?;

        let is_array = self.peek_is_symbol('[');
        if is_array {
            self.eat_symbol('[')?;
            self.push_variable(&name)?;
            self.compile_expression()?;
            self.vm.write_arithmetic(ArithmeticCommand::Add)?;
            self.eat_symbol(']')?;
        }

        self.eat_symbol('=')?;
        self.compile_expression()?;
        self.eat_symbol(';')?;

        if is_array {
            self.vm.write_pop(Segment::Temp, 0)?;
            self.vm.write_pop(Segment::Pointer, 1)?;
            self.vm.write_push(Segment::Temp, 0)?;
            self.vm.write_pop(Segment::That, 0)?;
        } else {
            let kind = self
                .symbols
                .kind_of(&name)
                .ok_or_else(|| Error::UnknownIdentifier(name.clone()))?;
            let index = self.symbols.index_of(&name).expect("kind_of succeeded");
            self.vm.write_pop(kind_to_segment(kind), index)?;
        }
        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), Error> {
        let n = self.next_label();
        let top = format!("WHILE_EXP{n}");
        let end = format!("WHILE_END{n}");

        self.eat_keyword(Keyword::While)?;
        self.vm.write_label(&top)?;
        self.eat_symbol('(')?;
        self.compile_expression()?;
        self.eat_symbol(')')?;
        self.vm.write_arithmetic(ArithmeticCommand::Not)?;
        self.vm.write_if(&end)?;

        self.eat_symbol('{')?;
        self.compile_statements()?;
        self.eat_symbol('}')?;

        self.vm.write_goto(&top)?;
        self.vm.write_label(&end)?;
        Ok(())
    }

    fn compile_return(&mut self) -> Result<(), Error> {
        self.eat_keyword(Keyword::Return)?;
        if self.peek_is_symbol(';') {
            self.vm.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.eat_symbol(';')?;
        self.vm.write_return()?;
        Ok(())
    }

    fn compile_if(&mut self) -> Result<(), Error> {
        let n = self.next_label();
        let true_label = format!("IF_TRUE{n}");
        let false_label = format!("IF_FALSE{n}");
        let end_label = format!("IF_END{n}");

        self.eat_keyword(Keyword::If)?;
        self.eat_symbol('(')?;
        self.compile_expression()?;
        self.eat_symbol(')')?;

        self.vm.write_if(&true_label)?;
        self.vm.write_goto(&false_label)?;
        self.vm.write_label(&true_label)?;

        self.eat_symbol('{')?;
        self.compile_statements()?;
        self.eat_symbol('}')?;

        if self.peek_is_keyword(Keyword::Else) {
            self.vm.write_goto(&end_label)?;
            self.vm.write_label(&false_label)?;
            self.eat_keyword(Keyword::Else)?;
            self.eat_symbol('{')?;
            self.compile_statements()?;
            self.eat_symbol('}')?;
            self.vm.write_label(&end_label)?;
        } else {
            self.vm.write_label(&false_label)?;
        }
        Ok(())
    }

    fn compile_expression(&mut self) -> Result<(), Error> {
        self.compile_term()?;
        while let Some(op) = self.peek_op() {
            self.eat_symbol(op)?;
            self.compile_term()?;
            self.compile_op(op)?;
        }
        Ok(())
    }

    fn compile_op(&mut self, op: char) -> Result<(), Error> {
        match op {
            '+' => self.vm.write_arithmetic(ArithmeticCommand::Add)?,
            '-' => self.vm.write_arithmetic(ArithmeticCommand::Sub)?,
            '=' => self.vm.write_arithmetic(ArithmeticCommand::Eq)?,
            '>' => self.vm.write_arithmetic(ArithmeticCommand::Gt)?,
            '<' => self.vm.write_arithmetic(ArithmeticCommand::Lt)?,
            '&' => self.vm.write_arithmetic(ArithmeticCommand::And)?,
            '|' => self.vm.write_arithmetic(ArithmeticCommand::Or)?,
            '*' => self.vm.write_call("Math.multiply", 2)?,
            '/' => self.vm.write_call("Math.divide", 2)?,
            _ => unreachable!("peek_op only returns recognized operators"),
        }
        Ok(())
    }

    fn compile_term(&mut self) -> Result<(), Error> {
        match self.peek()? {
            Token::IntConst(value) => {
                let value = *value;
                self.advance();
                self.vm.write_push(Segment::Constant, value)?;
            }
            Token::StringConst(text) => {
                let text = text.clone();
                self.advance();
                self.vm.write_push(Segment::Constant, text.len() as u16)?;
                self.vm.write_call("String.new", 1)?;
                for byte in text.bytes() {
                    self.vm.write_push(Segment::Constant, u16::from(byte))?;
                    self.vm.write_call("String.appendChar", 2)?;
                }
            }
            Token::Keyword(Keyword::True) => {
                self.advance();
                self.vm.write_push(Segment::Constant, 0)?;
                self.vm.write_arithmetic(ArithmeticCommand::Not)?;
            }
            Token::Keyword(Keyword::False | Keyword::Null) => {
                self.advance();
                self.vm.write_push(Segment::Constant, 0)?;
            }
            Token::Keyword(Keyword::This) => {
                self.advance();
                self.vm.write_push(Segment::Pointer, 0)?;
            }
            Token::Symbol('(') => {
                self.eat_symbol('(')?;
                self.compile_expression()?;
                self.eat_symbol(')')?;
            }
            Token::Symbol(c) if *c == '-' || *c == '~' => {
                let op = *c;
                self.eat_symbol(op)?;
                self.compile_term()?;
                if op == '-' {
                    self.vm.write_arithmetic(ArithmeticCommand::Neg)?;
                } else {
                    self.vm.write_arithmetic(ArithmeticCommand::Not)?;
                }
            }
            Token::Identifier(_) => {
                let name = self.eat_identifier()?;
                if self.peek_is_symbol('[') {
                    self.eat_symbol('[')?;
                    self.push_variable(&name)?;
                    self.compile_expression()?;
                    self.vm.write_arithmetic(ArithmeticCommand::Add)?;
                    self.eat_symbol(']')?;
                    self.vm.write_pop(Segment::Pointer, 1)?;
                    self.vm.write_push(Segment::That, 0)?;
                } else if self.peek_is_symbol('(') || self.peek_is_symbol('.') {
                    self.compile_subroutine_call(&name)?;
                } else {
                    self.push_variable(&name)?;
                }
            }
            other => {
                return Err(Error::Expected {
                    expected: "a term".to_string(),
                    found: format!("{other:?}"),
                });
            }
        }
        Ok(())
    }

    /// Resolves and emits a subroutine call whose callee name has already
    /// been consumed from the token stream: a bound method on `this`
    /// (`name(args)`), a method on a known-typed variable
    /// (`id.name(args)`), or a static/constructor fallback
    /// (`id.name(args)` where `id` is not a known variable).
    fn compile_subroutine_call(&mut self, name: &str) -> Result<(), Error> {
        let (function_name, mut n_args) = if self.peek_is_symbol('.') {
            self.eat_symbol('.')?;
            let method_name = self.eat_identifier()?;
            if let Some(kind) = self.symbols.kind_of(name) {
                let index = self.symbols.index_of(name).expect("kind_of succeeded");
                let var_type = self.symbols.type_of(name).expect("kind_of succeeded").to_string();
                self.vm.write_push(kind_to_segment(kind), index)?;
                (format!("{var_type}.{method_name}"), 1)
            } else {
                (format!("{name}.{method_name}"), 0)
            }
        } else {
            self.vm.write_push(Segment::Pointer, 0)?;
            (format!("{}.{name}", self.class_name), 1)
        };

        self.eat_symbol('(')?;
        n_args += self.compile_expression_list()?;
        self.eat_symbol(')')?;
        self.vm.write_call(&function_name, n_args)?;
        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<u16, Error> {
        let mut count = 0u16;
        if !self.peek_is_symbol(')') {
            self.compile_expression()?;
            count += 1;
            while self.peek_is_symbol(',') {
                self.eat_symbol(',')?;
                self.compile_expression()?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Pushes a resolved simple variable by name.
    fn push_variable(&mut self, name: &str) -> Result<(), Error> {
        let kind = self
            .symbols
            .kind_of(name)
            .ok_or_else(|| Error::UnknownIdentifier(name.to_string()))?;
        let index = self.symbols.index_of(name).expect("kind_of succeeded");
        self.vm.write_push(kind_to_segment(kind), index)?;
        Ok(())
    }

    fn next_label(&mut self) -> u32 {
        let n = self.label_counter;
        self.label_counter += 1;
        n
    }

    // --- token-stream plumbing -------------------------------------------------

    fn peek(&self) -> Result<&Token, Error> {
        self.tokens.get(self.pos).ok_or(Error::UnexpectedEof)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn peek_is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Keyword(k)) if *k == keyword)
    }

    fn peek_is_symbol(&self, symbol: char) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Symbol(c)) if *c == symbol)
    }

    fn peek_op(&self) -> Option<char> {
        match self.tokens.get(self.pos) {
            Some(Token::Symbol(c))
                if matches!(*c, '+' | '-' | '*' | '/' | '&' | '|' | '<' | '>' | '=') =>
            {
                Some(*c)
            }
            _ => None,
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> Result<(), Error> {
        match self.peek()? {
            Token::Keyword(k) if *k == keyword => {
                self.advance();
                Ok(())
            }
            other => Err(Error::Expected {
                expected: format!("{keyword:?}"),
                found: format!("{other:?}"),
            }),
        }
    }

    fn eat_any_keyword(&mut self, keywords: &[Keyword]) -> Result<Keyword, Error> {
        match self.peek()? {
            Token::Keyword(k) if keywords.contains(k) => {
                let k = *k;
                self.advance();
                Ok(k)
            }
            other => Err(Error::Expected {
                expected: format!("{keywords:?}"),
                found: format!("{other:?}"),
            }),
        }
    }

    fn eat_symbol(&mut self, symbol: char) -> Result<(), Error> {
        match self.peek()? {
            Token::Symbol(c) if *c == symbol => {
                self.advance();
                Ok(())
            }
            other => Err(Error::Expected {
                expected: format!("{symbol:?}"),
                found: format!("{other:?}"),
            }),
        }
    }

    fn eat_identifier(&mut self) -> Result<String, Error> {
        match self.peek()? {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(Error::Expected {
                expected: "an identifier".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    /// Consumes a type name: `int`/`char`/`boolean` or a class identifier.
    fn eat_type(&mut self) -> Result<String, Error> {
        match self.peek()? {
            Token::Keyword(k @ (Keyword::Int | Keyword::Char | Keyword::Boolean)) => {
                let name = match k {
                    Keyword::Int => "int",
                    Keyword::Char => "char",
                    Keyword::Boolean => "boolean",
                    _ => unreachable!(),
                };
                self.advance();
                Ok(name.to_string())
            }
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(Error::Expected {
                expected: "a type".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }
}
