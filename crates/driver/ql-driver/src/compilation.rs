//! Memoized compilation of a set of syntax trees

use crate::{CompileError, CompilerOptions};
use ql_binder::{BindError, bind_program};
use ql_bound::BoundProgram;
use ql_cfg::ControlFlowGraph;
use ql_diagnostics::{Diagnostic, DiagnosticKind};
use ql_interpreter::{EvaluationResult, Evaluator, VariableStore};
use ql_lower::{LoweredProgram, lower};
use ql_span::Span;
use ql_symbols::MethodSymbol;
use ql_syntax::SyntaxTree;
use std::sync::OnceLock;
use tracing::{debug, instrument};

/// The syntax trees of one program and everything derived from them
///
/// Binding runs at most once. The first caller of
/// [`bound_program`](Self::bound_program) performs it and every later or
/// concurrent caller observes the same [`BoundProgram`].
#[derive(Debug)]
pub struct Compilation {
    trees: Vec<SyntaxTree>,
    options: CompilerOptions,
    bound: OnceLock<Result<BoundProgram, BindError>>,
}

impl Compilation {
    /// Creates a compilation over `trees`, one per compilation unit
    pub fn new(trees: Vec<SyntaxTree>, options: CompilerOptions) -> Self {
        Self {
            trees,
            options,
            bound: OnceLock::new(),
        }
    }

    /// Compilation units in order
    pub fn trees(&self) -> &[SyntaxTree] {
        &self.trees
    }

    /// Options this compilation was created with
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Bound program, binding on first use
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Bind`] when the syntax trees are malformed.
    pub fn bound_program(&self) -> Result<&BoundProgram, CompileError> {
        self.bound
            .get_or_init(|| {
                debug!(units = self.trees.len(), "binding compilation");
                bind_program(&self.trees, &self.options.bind_options())
            })
            .as_ref()
            .map_err(|error| CompileError::Bind(error.clone()))
    }

    /// Diagnostics reported while binding
    ///
    /// # Errors
    ///
    /// See [`bound_program`](Self::bound_program).
    pub fn diagnostics(&self) -> Result<&[Diagnostic], CompileError> {
        Ok(&self.bound_program()?.diagnostics)
    }

    /// Lowers the bound program
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::HasDiagnostics`] when binding reported
    /// anything, otherwise any lowering failure.
    pub fn lowered_program(&self) -> Result<LoweredProgram, CompileError> {
        let bound = self.bound_program()?;
        if !bound.is_valid() {
            return Err(CompileError::HasDiagnostics {
                count: bound.diagnostics.len(),
            });
        }
        Ok(lower(bound, self.options.lower_options())?)
    }

    /// Binds, lowers and evaluates the program against `store`
    ///
    /// Evaluation only runs when binding reported no diagnostics; otherwise
    /// the binding diagnostics are returned. Failures of lowering or of the
    /// evaluator itself come back as a single internal-error diagnostic.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Bind`] when the syntax trees are malformed.
    #[instrument(level = "debug", skip_all)]
    pub fn evaluate(&self, store: &mut VariableStore) -> Result<EvaluationResult, CompileError> {
        let bound = self.bound_program()?;
        if !bound.is_valid() {
            debug!(diagnostics = bound.diagnostics.len(), "skipping evaluation");
            return Ok(EvaluationResult {
                diagnostics: bound.diagnostics.clone(),
                ..EvaluationResult::default()
            });
        }
        let outcome = lower(bound, self.options.lower_options())
            .map_err(CompileError::from)
            .and_then(|program| {
                Evaluator::new(&program)
                    .with_max_call_depth(self.options.max_call_depth)
                    .run(store)
                    .map_err(CompileError::from)
            });
        match outcome {
            Ok(result) => Ok(result),
            Err(error) => {
                debug!(%error, "internal error");
                Ok(EvaluationResult {
                    diagnostics: vec![Diagnostic::new(
                        None,
                        Span::default(),
                        DiagnosticKind::Internal {
                            message: error.to_string(),
                        },
                    )],
                    ..EvaluationResult::default()
                })
            }
        }
    }

    /// Lowered methods printed one after another
    ///
    /// # Errors
    ///
    /// See [`lowered_program`](Self::lowered_program).
    pub fn emit_tree(&self) -> Result<String, CompileError> {
        Ok(self
            .lowered_program()?
            .methods
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    /// Control-flow graph of every lowered method
    ///
    /// # Errors
    ///
    /// See [`lowered_program`](Self::lowered_program); a body the graph
    /// builder rejects is [`CompileError::Cfg`].
    pub fn control_flow_graphs(&self) -> Result<Vec<(MethodSymbol, ControlFlowGraph)>, CompileError> {
        self.lowered_program()?
            .methods
            .into_iter()
            .map(|method| {
                ControlFlowGraph::from_body(&method.body)
                    .map(|graph| (method.symbol, graph))
                    .map_err(CompileError::from)
            })
            .collect()
    }

    /// DOT rendering of every control-flow graph, in method order
    ///
    /// # Errors
    ///
    /// See [`control_flow_graphs`](Self::control_flow_graphs).
    pub fn emit_control_flow_graphs(&self) -> Result<String, CompileError> {
        Ok(self
            .control_flow_graphs()?
            .iter()
            .map(|(_, graph)| graph.dot().to_string())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
