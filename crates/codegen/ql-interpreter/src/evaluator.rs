//! Instruction-pointer evaluation of lowered methods

use crate::value::ArrayRef;
use crate::{InterpreterError, RuntimeError, Value, VariableStore};
use ql_bound::{BinaryOperatorKind, BoundExpression, BoundMethod, BoundStatement};
use ql_const_eval::{convert, fold_binary, fold_unary};
use ql_diagnostics::{Diagnostic, DiagnosticKind};
use ql_lower::LoweredProgram;
use ql_span::Span;
use ql_symbols::{BuiltinMethod, ConstValue, LabelSymbol, MethodId, MethodKind, MethodSymbol, TypeRef, builtins};
use rustc_hash::FxHashMap;
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// Nested user calls allowed unless [`Evaluator::with_max_call_depth`] says otherwise
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Outcome of running a program
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationResult {
    /// Runtime faults, empty when the program ran to completion
    pub diagnostics: Vec<Diagnostic>,
    /// Last value produced by a declaration or expression statement of the entry method
    pub value: Option<Value>,
    /// Lines written by `print`
    pub output: Vec<String>,
}

impl EvaluationResult {
    /// Returns true when the program ran without a runtime fault
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Why execution stopped early
enum Halt {
    Runtime(RuntimeError),
    Internal(InterpreterError),
}

impl From<RuntimeError> for Halt {
    fn from(error: RuntimeError) -> Self {
        Self::Runtime(error)
    }
}

impl From<InterpreterError> for Halt {
    fn from(error: InterpreterError) -> Self {
        Self::Internal(error)
    }
}

/// Walks lowered bodies statement by statement
///
/// Every call gets a fresh frame except the entry method, which runs against
/// the caller's store.
#[derive(Debug)]
pub struct Evaluator<'program> {
    methods: FxHashMap<MethodId, &'program BoundMethod>,
    entry: Option<&'program BoundMethod>,
    output: Vec<String>,
    value: Option<Value>,
    depth: usize,
    max_depth: usize,
}

impl<'program> Evaluator<'program> {
    /// Prepares to run `program`
    pub fn new(program: &'program LoweredProgram) -> Self {
        let methods = program
            .methods
            .iter()
            .filter_map(|method| match method.symbol.kind {
                MethodKind::User(id) => Some((id, method)),
                MethodKind::Builtin(_) => None,
            })
            .collect();
        Self {
            methods,
            entry: program.entry_method(),
            output: Vec::new(),
            value: None,
            depth: 0,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Limits how deeply user methods may call each other
    #[must_use]
    pub fn with_max_call_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Runs the entry method against `store`
    ///
    /// A program without an entry method does nothing. Runtime faults stop
    /// evaluation and are returned as diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`InterpreterError`] when the program is not lowered or refers
    /// to symbols it does not define.
    #[instrument(level = "debug", skip_all)]
    pub fn run(mut self, store: &mut VariableStore) -> Result<EvaluationResult, InterpreterError> {
        let Some(entry) = self.entry else {
            debug!("no entry method");
            return Ok(EvaluationResult::default());
        };
        let mut diagnostics = Vec::new();
        match self.execute(entry, store) {
            Ok(_) => {}
            Err(Halt::Runtime(error)) => {
                debug!(%error, "runtime fault");
                diagnostics.push(Diagnostic::new(
                    None,
                    Span::default(),
                    DiagnosticKind::Runtime {
                        message: error.to_string(),
                    },
                ));
            }
            Err(Halt::Internal(error)) => return Err(error),
        }
        debug!(lines = self.output.len(), "evaluation finished");
        Ok(EvaluationResult {
            diagnostics,
            value: self.value,
            output: self.output,
        })
    }

    fn execute(&mut self, method: &'program BoundMethod, frame: &mut VariableStore) -> Result<Option<Value>, Halt> {
        let name = &method.symbol.name;
        let BoundStatement::Block(statements) = &method.body else {
            return Err(InterpreterError::NotLowered { method: name.clone() }.into());
        };
        let labels: FxHashMap<&LabelSymbol, usize> = statements
            .iter()
            .enumerate()
            .filter_map(|(index, statement)| match statement {
                BoundStatement::Label(label) => Some((label, index)),
                _ => None,
            })
            .collect();
        let target = |label: &LabelSymbol| {
            labels
                .get(label)
                .copied()
                .ok_or_else(|| InterpreterError::UndeclaredLabel {
                    method: name.clone(),
                    label: label.name.clone(),
                })
        };

        let mut pointer = 0;
        while let Some(statement) = statements.get(pointer) {
            pointer += 1;
            match statement {
                BoundStatement::VariableDeclaration { variable, initializer } => {
                    let value = self.evaluate(initializer, frame)?;
                    self.record(&value);
                    frame.set(variable, value);
                }
                BoundStatement::Expression(expression) => {
                    let value = self.evaluate(expression, frame)?;
                    self.record(&value);
                }
                BoundStatement::Label(_) | BoundStatement::Nop => {}
                BoundStatement::Goto(label) => pointer = target(label)?,
                BoundStatement::ConditionalGoto {
                    label,
                    condition,
                    jump_if_true,
                } => {
                    if self.condition(condition, frame)? == *jump_if_true {
                        pointer = target(label)?;
                    }
                }
                BoundStatement::Return(value) => {
                    return value.as_ref().map(|expression| self.evaluate(expression, frame)).transpose();
                }
                BoundStatement::Block(_)
                | BoundStatement::If { .. }
                | BoundStatement::While { .. }
                | BoundStatement::DoWhile { .. }
                | BoundStatement::For { .. }
                | BoundStatement::MethodDeclaration(_) => {
                    return Err(InterpreterError::NotLowered { method: name.clone() }.into());
                }
            }
        }
        Ok(None)
    }

    /// Remembers entry-level values for [`EvaluationResult::value`]
    fn record(&mut self, value: &Value) {
        if self.depth == 0 && !matches!(value, Value::Void) {
            self.value = Some(value.clone());
        }
    }

    fn condition(&mut self, expression: &BoundExpression, frame: &mut VariableStore) -> Result<bool, Halt> {
        let value = self.evaluate(expression, frame)?;
        value.as_bool().ok_or_else(|| {
            InterpreterError::TypeMismatch {
                expected: "bool",
                found: value.kind_name(),
            }
            .into()
        })
    }

    fn evaluate(&mut self, expression: &BoundExpression, frame: &mut VariableStore) -> Result<Value, Halt> {
        match expression {
            BoundExpression::Error => Err(InterpreterError::ErrorExpression.into()),
            BoundExpression::Literal(value) => Ok(Value::from(value.clone())),
            BoundExpression::Variable(variable) => frame
                .get(variable)
                .cloned()
                .or_else(|| variable.constant_value().cloned().map(Value::from))
                .ok_or_else(|| {
                    InterpreterError::UnboundVariable {
                        name: variable.name.clone(),
                    }
                    .into()
                }),
            BoundExpression::Assignment { variable, value } => {
                let value = self.evaluate(value, frame)?;
                frame.set(variable, value.clone());
                Ok(value)
            }
            BoundExpression::Unary { operator, operand } => {
                let operand = self.evaluate(operand, frame)?;
                let folded = fold_unary(operator.kind, &scalar(&operand)?).map_err(InterpreterError::from)?;
                Ok(Value::from(folded))
            }
            BoundExpression::Binary { left, operator, right } => self.binary(left, operator.kind, right, frame),
            BoundExpression::Call { method, arguments } => {
                let arguments = self.arguments(arguments, frame)?;
                self.call(method, arguments)
            }
            BoundExpression::MemberCall {
                receiver,
                method,
                arguments,
            } => {
                let receiver = self.evaluate(receiver, frame)?;
                self.arguments(arguments, frame)?;
                match method.kind {
                    MethodKind::Builtin(BuiltinMethod::ArrayLength) => {
                        Ok(Value::Int(array(&receiver)?.borrow().len() as i64))
                    }
                    MethodKind::Builtin(_) | MethodKind::User(_) => Err(InterpreterError::UnknownMethod {
                        name: method.to_string(),
                    }
                    .into()),
                }
            }
            BoundExpression::Index { receiver, index, .. } => {
                let elements = array(&self.evaluate(receiver, frame)?)?;
                let index = self.evaluate(index, frame)?;
                element(&elements, &index)
            }
            BoundExpression::IndexAssignment {
                receiver,
                index,
                indexer,
                operator,
                value,
            } => {
                let elements = array(&self.evaluate(receiver, frame)?)?;
                let index = self.evaluate(index, frame)?;
                let value = match operator {
                    None => self.evaluate(value, frame)?,
                    Some(operator) => {
                        let current = element(&elements, &index)?;
                        let combined = self.apply(current, operator.kind, value, frame)?;
                        if operator.result_type == indexer.element {
                            combined
                        } else {
                            convert_value(combined, &indexer.element)?
                        }
                    }
                };
                let position = slot(&index, elements.borrow().len())?;
                let mut slots = elements.borrow_mut();
                if let Some(element) = slots.get_mut(position) {
                    *element = value.clone();
                }
                Ok(value)
            }
            BoundExpression::Conversion { ty, operand } => {
                let value = self.evaluate(operand, frame)?;
                convert_value(value, ty)
            }
            BoundExpression::ArrayCreation { ty, size } => {
                let size = integer(&self.evaluate(size, frame)?)?;
                let length = usize::try_from(size).map_err(|_| RuntimeError::NegativeArraySize { size })?;
                let element = ty
                    .indexer()
                    .map_or(Value::Void, |indexer| Value::default_for(&indexer.element));
                Ok(Value::array(vec![element; length]))
            }
        }
    }

    /// Binary operators, short-circuiting `&&` and `||`
    fn binary(
        &mut self,
        left: &BoundExpression,
        kind: BinaryOperatorKind,
        right: &BoundExpression,
        frame: &mut VariableStore,
    ) -> Result<Value, Halt> {
        let left = self.evaluate(left, frame)?;
        self.apply(left, kind, right, frame)
    }

    /// Combines an evaluated left operand with `right`, evaluating `right` only
    /// when the operator needs it
    fn apply(
        &mut self,
        left: Value,
        kind: BinaryOperatorKind,
        right: &BoundExpression,
        frame: &mut VariableStore,
    ) -> Result<Value, Halt> {
        match kind {
            BinaryOperatorKind::LogicalAnd if left.as_bool() == Some(false) => return Ok(left),
            BinaryOperatorKind::LogicalOr if left.as_bool() == Some(true) => return Ok(left),
            _ => {}
        }
        let right = self.evaluate(right, frame)?;
        if matches!(left, Value::Array(_)) || matches!(right, Value::Array(_)) {
            match kind {
                BinaryOperatorKind::Equals => return Ok(Value::Bool(left == right)),
                BinaryOperatorKind::NotEquals => return Ok(Value::Bool(left != right)),
                _ => {}
            }
        }
        let folded = fold_binary(&scalar(&left)?, kind, &scalar(&right)?).map_err(InterpreterError::from)?;
        Ok(Value::from(folded))
    }

    fn arguments(&mut self, arguments: &[BoundExpression], frame: &mut VariableStore) -> Result<Vec<Value>, Halt> {
        arguments
            .iter()
            .map(|argument| self.evaluate(argument, frame))
            .collect()
    }

    fn call(&mut self, method: &MethodSymbol, arguments: Vec<Value>) -> Result<Value, Halt> {
        match method.kind {
            MethodKind::Builtin(BuiltinMethod::Print) => {
                let line = arguments.first().map(ToString::to_string).unwrap_or_default();
                trace!(%line, "print");
                self.output.push(line);
                Ok(Value::Void)
            }
            MethodKind::Builtin(BuiltinMethod::Len) => {
                let text = arguments
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| InterpreterError::TypeMismatch {
                        expected: "string",
                        found: arguments.first().map_or("void", Value::kind_name),
                    })?;
                Ok(Value::Int(text.chars().count() as i64))
            }
            MethodKind::Builtin(BuiltinMethod::ArrayLength) => Err(InterpreterError::UnknownMethod {
                name: method.to_string(),
            }
            .into()),
            MethodKind::User(id) => {
                let body = self
                    .methods
                    .get(&id)
                    .copied()
                    .ok_or_else(|| InterpreterError::UnknownMethod {
                        name: method.to_string(),
                    })?;
                if body.parameters.len() != arguments.len() {
                    return Err(InterpreterError::ArgumentCount {
                        name: method.to_string(),
                        expected: body.parameters.len(),
                        found: arguments.len(),
                    }
                    .into());
                }
                if self.depth >= self.max_depth {
                    return Err(RuntimeError::CallDepthExceeded {
                        method: method.name.clone(),
                        limit: self.max_depth,
                    }
                    .into());
                }
                let mut frame = VariableStore::new();
                for (parameter, argument) in body.parameters.iter().zip(arguments) {
                    frame.set(parameter, argument);
                }
                trace!(method = %method, depth = self.depth, "call");
                self.depth += 1;
                let returned = self.execute(body, &mut frame);
                self.depth -= 1;
                Ok(returned?.unwrap_or(Value::Void))
            }
        }
    }
}

fn scalar(value: &Value) -> Result<ConstValue, Halt> {
    value.to_const().ok_or_else(|| {
        InterpreterError::TypeMismatch {
            expected: "a scalar",
            found: value.kind_name(),
        }
        .into()
    })
}

fn integer(value: &Value) -> Result<i64, Halt> {
    value.as_int().ok_or_else(|| {
        InterpreterError::TypeMismatch {
            expected: "int",
            found: value.kind_name(),
        }
        .into()
    })
}

fn array(value: &Value) -> Result<ArrayRef, Halt> {
    match value {
        Value::Array(elements) => Ok(Rc::clone(elements)),
        other => Err(InterpreterError::TypeMismatch {
            expected: "array",
            found: other.kind_name(),
        }
        .into()),
    }
}

/// Element at `index`, which must be in range and initialized
fn element(elements: &ArrayRef, index: &Value) -> Result<Value, Halt> {
    let position = slot(index, elements.borrow().len())?;
    let element = elements.borrow().get(position).cloned().unwrap_or(Value::Void);
    if matches!(element, Value::Void) {
        return Err(RuntimeError::UninitializedElement { index: position }.into());
    }
    Ok(element)
}

/// Position of `index` in an array of `length` elements
fn slot(index: &Value, length: usize) -> Result<usize, Halt> {
    let index = integer(index)?;
    usize::try_from(index)
        .ok()
        .filter(|position| *position < length)
        .ok_or_else(|| RuntimeError::IndexOutOfRange { index, length }.into())
}

fn convert_value(value: Value, ty: &TypeRef) -> Result<Value, Halt> {
    if *ty == builtins().object || matches!(value, Value::Array(_)) {
        return Ok(value);
    }
    let converted = convert(&scalar(&value)?, ty).map_err(RuntimeError::Conversion)?;
    Ok(Value::from(converted))
}

/// Runs the entry method of `program` against `store` with
/// [`DEFAULT_MAX_CALL_DEPTH`]
///
/// # Errors
///
/// See [`Evaluator::run`].
pub fn evaluate(program: &LoweredProgram, store: &mut VariableStore) -> Result<EvaluationResult, InterpreterError> {
    Evaluator::new(program).run(store)
}
