//! Action-script compilation
//!
//! Compiles the inline behavior script of a frame declaration: either one
//! bare action call or a brace-delimited statement block with `if`/`else`
//! and `return`. Blocks synthesize a return signature bottom-up; sibling
//! statements and branches must agree on a common signature prefix.

use crate::diagnostic::error_codes;
use crate::expr::{CallExpr, Constant, Expr, IfElseExpr};
use crate::scanner::{Token, TokenKind};
use crate::states::StateParser;
use crate::symbols::{
    internal_cast_name, Callable, ParamKind, Signature, ValueType, SPECIAL_DISPATCH,
};

impl StateParser<'_> {
    /// Compile an action script. `first` is the already-read token that
    /// triggered compilation: `{` selects the block form, anything else is
    /// the name of a single bare action call.
    ///
    /// Returns the compiled tree (None when the block held no statements),
    /// the synthesized return signature (None when no statement produced
    /// one), and whether the last statement parsed ends with a return.
    pub(crate) fn parse_actions(
        &mut self,
        letters: &str,
        first: Token,
    ) -> Result<(Option<Expr>, Option<Signature>, bool), ()> {
        if !first.is("{") {
            // Single bare call, wrapped in an implicit return that forwards
            // the callee's results
            let call = self.parse_action(first, letters)?;
            let proto = call.ret.clone();
            return Ok((
                Some(Expr::Return(Some(Box::new(call)))),
                Some(proto),
                true,
            ));
        }

        let mut statements = Vec::new();
        let mut proto: Option<Signature> = None;
        let mut last_was_ret = false;

        self.script_depth += 1;
        loop {
            let tok = self.expect_token()?;
            if tok.is("}") {
                self.script_depth -= 1;
                break;
            }
            last_was_ret = false;
            let add = if tok.is("if") {
                self.parse_if(letters, &mut proto, &mut last_was_ret)?
            } else if tok.is("return") {
                last_was_ret = true;
                let next = self.expect_token()?;
                let (retexp, ret_proto) = if next.is(";") {
                    // Returning nothing still contributes a signature
                    (None, Signature::empty())
                } else {
                    let call = self.parse_action(next, letters)?;
                    self.expect_exact(";")?;
                    let ret = call.ret.clone();
                    (Some(Box::new(call)), ret)
                };
                proto = self.return_check(proto, Some(ret_proto))?;
                Expr::Return(retexp)
            } else {
                let call = self.parse_action(tok, letters)?;
                self.expect_exact(";")?;
                Expr::Call(call)
            };
            statements.push(add);
        }

        let code = if statements.is_empty() {
            None
        } else {
            Some(Expr::Sequence(statements))
        };
        Ok((code, proto, last_was_ret))
    }

    /// `if ( <cond> ) { ... } [else (if ... | { ... })]` — braces are
    /// mandatory around both branches. The statement only counts as ending
    /// with a return when both branches exist and each ends with one; a
    /// missing else can never count.
    fn parse_if(
        &mut self,
        letters: &str,
        proto: &mut Option<Signature>,
        last_was_ret: &mut bool,
    ) -> Result<Expr, ()> {
        self.expect_exact("(")?;
        let cond = self.parse_expression()?;
        self.expect_exact(")")?;

        let lbrace = self.expect_exact("{")?;
        let (then_part, then_proto, then_ret) = self.parse_actions(letters, lbrace)?;

        let mut else_part = None;
        let mut else_proto = None;
        let mut else_ret = false;
        if self.sc.check("else") {
            if self.sc.check("if") {
                let nested = self.parse_if(letters, &mut else_proto, &mut else_ret)?;
                else_part = Some(Box::new(nested));
            } else {
                let lbrace = self.expect_exact("{")?;
                let (part, part_proto, part_ret) = self.parse_actions(letters, lbrace)?;
                else_part = part.map(Box::new);
                else_proto = part_proto;
                else_ret = part_ret;
            }
        }

        let node = Expr::IfElse(IfElseExpr {
            cond: Box::new(cond),
            then_part: then_part.map(Box::new),
            else_part,
        });
        *proto = self.return_check(proto.take(), then_proto)?;
        *proto = self.return_check(proto.take(), else_proto)?;
        if then_ret && else_ret {
            *last_was_ret = true;
        }
        Ok(node)
    }

    /// Unify two optional return signatures. A signature that declares fewer
    /// return types is compatible with a longer one when it matches the
    /// longer one's leading types; the shorter signature wins. A signature
    /// that returns nothing is only compatible with another empty one.
    pub(crate) fn return_check(
        &mut self,
        first: Option<Signature>,
        second: Option<Signature>,
    ) -> Result<Option<Signature>, ()> {
        let (mut shorter, mut longer) = match (first, second) {
            (None, second) => return Ok(second),
            (first, None) => return Ok(first),
            (Some(first), Some(second)) => (first, second),
        };
        if longer.len() < shorter.len() {
            std::mem::swap(&mut shorter, &mut longer);
        }
        let compatible = if shorter.is_empty() {
            longer.is_empty()
        } else {
            shorter.types() == &longer.types()[..shorter.len()]
        };
        if !compatible {
            self.error_here(
                error_codes::RETURN_TYPE_MISMATCH,
                "Return types are incompatible",
            );
            return Err(());
        }
        Ok(Some(shorter))
    }

    /// Append an implied `return;` to a compiled sequence that does not end
    /// with one. Only legal when the unified signature returns nothing;
    /// otherwise some path fails to produce the declared values.
    pub(crate) fn add_implicit_return(
        &mut self,
        code: &mut Expr,
        proto: &Signature,
    ) -> Result<(), ()> {
        if !proto.is_empty() {
            self.error_here(error_codes::MISSING_RETURN, "Not all paths return a value");
            return Err(());
        }
        if let Expr::Sequence(statements) = code {
            statements.push(Expr::Return(None));
        }
        Ok(())
    }

    /// Resolve one action-call name and parse its argument list. Built-in
    /// numbered specials take precedence; otherwise the (possibly
    /// alias-substituted) name must resolve in the symbol table.
    pub(crate) fn parse_action(&mut self, token: Token, letters: &str) -> Result<CallExpr, ()> {
        let lowered = token.text.to_ascii_lowercase();

        if let Some(call) = self.parse_action_special(&lowered, &token)? {
            return Ok(call);
        }

        let symbols = self.symbols;
        let name = internal_cast_name(&lowered);
        let Some(callable) = symbols.find(name) else {
            self.error(
                error_codes::INVALID_PARAMETER,
                format!("Invalid parameter '{}'", token.text),
                token.pos,
            );
            return Err(());
        };
        let args = self.parse_function_parameters(callable, letters)?;
        Ok(CallExpr {
            callee: callable.name.clone(),
            ret: callable.ret.clone(),
            args,
        })
    }

    /// Built-in specials compile to a call of the fixed dispatch function
    /// with the special's numeric id as a leading constant argument and up
    /// to five integer-cast arguments after it.
    fn parse_action_special(
        &mut self,
        name: &str,
        token: &Token,
    ) -> Result<Option<CallExpr>, ()> {
        let Some(&special) = self.specials.find(name) else {
            return Ok(None);
        };

        let mut args = vec![Expr::Parameter(Box::new(Expr::Constant(Constant::Int(
            special.id,
        ))))];
        let mut supplied = 0usize;
        if self.sc.check("(") {
            while supplied < 5 {
                let arg = self.parse_expression()?;
                args.push(Expr::Parameter(Box::new(Expr::IntCast(Box::new(arg)))));
                supplied += 1;
                if !self.sc.check(",") {
                    break;
                }
            }
            self.expect_exact(")")?;
        }
        if supplied < special.min_args {
            self.error(
                error_codes::ARITY_MISMATCH,
                format!("Too few arguments to {}", name),
                token.pos,
            );
            return Err(());
        }
        if supplied > special.max_args {
            self.error(
                error_codes::ARITY_MISMATCH,
                format!("Too many arguments to {}", name),
                token.pos,
            );
            return Err(());
        }

        let Some(dispatch) = self.symbols.find(SPECIAL_DISPATCH) else {
            self.error(
                error_codes::INVALID_PARAMETER,
                format!("Invalid parameter '{}'", name),
                token.pos,
            );
            return Err(());
        };
        Ok(Some(CallExpr {
            callee: dispatch.name.clone(),
            ret: dispatch.ret.clone(),
            args,
        }))
    }

    /// Match supplied arguments against the callee's declared parameters.
    /// Implicit self/action-context slots are skipped; an optional first
    /// parameter makes the whole parenthesized list optional; a variadic
    /// marker repeats the preceding parameter's type until `)`.
    pub(crate) fn parse_function_parameters(
        &mut self,
        callable: &Callable,
        letters: &str,
    ) -> Result<Vec<Expr>, ()> {
        let params = &callable.params;
        let mut pnum = callable.implicit_params();
        debug_assert!(params.len() >= pnum);
        let mut remaining = params.len().saturating_sub(pnum);
        let zero_params = remaining == 0;

        if remaining > 0 && !params[pnum].optional {
            self.expect_exact("(")?;
        } else if !self.sc.check("(") {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        while remaining > 0 {
            let arg = match params[pnum].kind {
                ParamKind::Typed(ValueType::State) => match self.sc.check_number() {
                    // A bare number in a state slot is a relative frame offset
                    Some(offset) => self.state_offset_arg(offset, letters)?,
                    None => self.parse_typed_argument(params[pnum].kind)?,
                },
                kind => self.parse_typed_argument(kind)?,
            };
            out.push(Expr::Parameter(Box::new(arg)));
            pnum += 1;
            remaining -= 1;
            if remaining > 0 {
                if params[pnum].kind == ParamKind::VarArgs {
                    if self.sc.check(")") {
                        return Ok(out);
                    }
                    // Further arguments re-use the preceding declared type
                    pnum -= 1;
                    remaining += 1;
                } else if params[pnum].optional && self.sc.check(")") {
                    return Ok(out);
                }
                self.expect_exact(",")?;
            }
        }
        if zero_params {
            if !self.sc.check(")") {
                self.error_here(
                    error_codes::ARITY_MISMATCH,
                    format!("You cannot pass parameters to '{}'", callable.name),
                );
                return Err(());
            }
        } else {
            self.expect_exact(")")?;
        }
        Ok(out)
    }

    /// The bare-number form of a state argument: 0 is the null state, a
    /// positive offset is relative to the frame about to be emitted and is
    /// only meaningful for single-letter declarations.
    fn state_offset_arg(&mut self, offset: i32, letters: &str) -> Result<Expr, ()> {
        if offset > 0 && letters.chars().count() > 1 {
            self.error_here(
                error_codes::BAD_JUMP_OFFSET,
                "You cannot use state jumps with a jump offset on multistate definitions",
            );
            return Err(());
        }
        if offset < 0 {
            self.error_here(
                error_codes::BAD_JUMP_OFFSET,
                "Negative jump offsets are not allowed",
            );
            return Err(());
        }
        if offset > 0 {
            Ok(Expr::StateByIndex(
                self.table.state_count() + offset as usize,
            ))
        } else {
            Ok(Expr::Constant(Constant::NoState))
        }
    }

    /// Parse one argument according to its declared parameter type
    fn parse_typed_argument(&mut self, kind: ParamKind) -> Result<Expr, ()> {
        match kind {
            ParamKind::Typed(ValueType::Int) => {
                Ok(Expr::IntCast(Box::new(self.parse_expression()?)))
            }
            ParamKind::Typed(ValueType::String) | ParamKind::Typed(ValueType::Sound) => {
                let tok = self.expect_token()?;
                match tok.kind {
                    TokenKind::Str => Ok(Expr::Constant(Constant::Str(tok.text))),
                    TokenKind::Ident => Ok(Expr::Constant(Constant::Name(tok.text))),
                    _ => {
                        self.error(
                            error_codes::SYNTAX_ERROR,
                            format!("Expected a string, found '{}'", tok.text),
                            tok.pos,
                        );
                        Err(())
                    }
                }
            }
            ParamKind::Typed(ValueType::State) => {
                let tok = self.expect_token()?;
                match tok.kind {
                    TokenKind::Str | TokenKind::Ident => {
                        Ok(Expr::Constant(Constant::StateLabel(tok.text)))
                    }
                    _ => {
                        self.error(
                            error_codes::SYNTAX_ERROR,
                            format!("Expected a state label, found '{}'", tok.text),
                            tok.pos,
                        );
                        Err(())
                    }
                }
            }
            _ => self.parse_expression(),
        }
    }

    /// Constant-expression subset accepted in argument positions: numeric
    /// and string literals, named engine constants, grouping, and unary
    /// sign folded into numeric constants.
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ()> {
        let tok = self.expect_token()?;
        match tok.kind {
            TokenKind::Number => {
                if let Some(value) = tok.int_value() {
                    Ok(Expr::Constant(Constant::Int(value)))
                } else if let Ok(value) = tok.text.parse::<f64>() {
                    Ok(Expr::Constant(Constant::Float(value)))
                } else {
                    self.error(
                        error_codes::SYNTAX_ERROR,
                        format!("Malformed number '{}'", tok.text),
                        tok.pos,
                    );
                    Err(())
                }
            }
            TokenKind::Str => Ok(Expr::Constant(Constant::Str(tok.text))),
            TokenKind::Ident => {
                if tok.is("true") {
                    Ok(Expr::Constant(Constant::Int(1)))
                } else if tok.is("false") {
                    Ok(Expr::Constant(Constant::Int(0)))
                } else {
                    Ok(Expr::Constant(Constant::Name(tok.text)))
                }
            }
            TokenKind::Punct => match tok.text.as_str() {
                "(" => {
                    let inner = self.parse_expression()?;
                    self.expect_exact(")")?;
                    Ok(inner)
                }
                "-" | "+" => {
                    let negate = tok.text == "-";
                    let inner = self.parse_expression()?;
                    match inner {
                        Expr::Constant(Constant::Int(value)) => Ok(Expr::Constant(
                            Constant::Int(if negate { -value } else { value }),
                        )),
                        Expr::Constant(Constant::Float(value)) => Ok(Expr::Constant(
                            Constant::Float(if negate { -value } else { value }),
                        )),
                        _ => {
                            self.error(
                                error_codes::SYNTAX_ERROR,
                                "Expected a numeric constant after unary sign",
                                tok.pos,
                            );
                            Err(())
                        }
                    }
                }
                _ => {
                    self.error(
                        error_codes::SYNTAX_ERROR,
                        format!("Expected an expression, found '{}'", tok.text),
                        tok.pos,
                    );
                    Err(())
                }
            },
        }
    }
}
