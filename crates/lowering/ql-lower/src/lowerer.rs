//! Fixed-point lowering driver

use crate::LowerError;
use crate::clean::flatten_and_clean;
use crate::desugar::{Desugarer, collect_constants};
use ql_bound::{BoundMethod, BoundProgram, BoundStatement, BoundTreeRewriter as _};
use ql_symbols::{LabelAllocator, LabelSymbol, MethodSymbol};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument, trace};

/// Knobs for lowering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowerOptions {
    /// Rewrite passes allowed per body before giving up
    pub max_passes: usize,
    /// Fold literal operations and propagate literal constants
    pub fold_constants: bool,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            max_passes: 64,
            fold_constants: true,
        }
    }
}

/// Lowered methods ready for evaluation
///
/// Every body is a block of flat statements: no nested blocks, no structured
/// control flow and no nested method declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoweredProgram {
    /// Methods in declaration order, hoisted methods after their parent
    pub methods: Vec<BoundMethod>,
    /// Entry method
    pub entry: Option<MethodSymbol>,
}

impl LoweredProgram {
    /// Method with the given signature
    pub fn method(&self, symbol: &MethodSymbol) -> Option<&BoundMethod> {
        self.methods.iter().find(|method| method.symbol == *symbol)
    }

    /// Body of the entry method
    pub fn entry_method(&self) -> Option<&BoundMethod> {
        self.entry.as_ref().and_then(|entry| self.method(entry))
    }
}

/// State shared by every body lowered within one compilation
#[derive(Debug, Clone)]
pub struct LoweringContext {
    options: LowerOptions,
    labels: LabelAllocator,
}

impl LoweringContext {
    /// Creates a context that continues numbering labels from `labels`
    pub fn new(options: LowerOptions, labels: LabelAllocator) -> Self {
        Self { options, labels }
    }

    /// Label allocator state, so later lowering never reuses a label
    pub fn labels(&self) -> &LabelAllocator {
        &self.labels
    }

    /// Lowers every method of `program`
    ///
    /// # Errors
    ///
    /// Returns the first [`LowerError`] raised by any body.
    pub fn lower_program(&mut self, program: &BoundProgram) -> Result<LoweredProgram, LowerError> {
        let mut methods = Vec::new();
        for method in &program.methods {
            methods.extend(self.lower_method(method.clone())?);
        }
        debug!(methods = methods.len(), "lowered program");
        Ok(LoweredProgram {
            methods,
            entry: program.entry.clone(),
        })
    }

    /// Lowers `method` and every method nested in it, parent first
    ///
    /// # Errors
    ///
    /// Returns [`LowerError`] when a body does not settle or jumps to an
    /// undeclared label.
    pub fn lower_method(&mut self, method: BoundMethod) -> Result<Vec<BoundMethod>, LowerError> {
        let (body, hoisted) = self.lower_body(&method.symbol.name, method.body)?;
        let mut lowered = vec![BoundMethod { body, ..method }];
        for nested in hoisted {
            lowered.extend(self.lower_method(nested)?);
        }
        Ok(lowered)
    }

    /// Rewrites `body` until a pass leaves it unchanged
    ///
    /// Returns the flat body and the nested methods pulled out of it.
    ///
    /// # Errors
    ///
    /// Returns [`LowerError::FixedPointNotReached`] after
    /// [`LowerOptions::max_passes`] passes that all changed the body, and
    /// [`LowerError::UndeclaredLabel`] when the settled body jumps to a label
    /// it does not declare.
    #[instrument(level = "debug", skip(self, body))]
    pub fn lower_body(
        &mut self,
        method: &str,
        body: BoundStatement,
    ) -> Result<(BoundStatement, Vec<BoundMethod>), LowerError> {
        let fold_constants = self.options.fold_constants;
        let mut hoisted = Vec::new();
        let mut current = body;
        for pass in 1..=self.options.max_passes {
            let constants = if fold_constants {
                collect_constants(&current)
            } else {
                FxHashMap::default()
            };
            let mut desugarer = Desugarer::new(&mut self.labels, constants, fold_constants);
            let rewritten = desugarer.rewrite_statement(current.clone());
            hoisted.extend(desugarer.into_hoisted());

            let cleaned = flatten_and_clean(rewritten);
            let next = BoundStatement::Block(cleaned.statements);
            let settled = !cleaned.promoted && next == current;
            trace!(pass, settled, "lowering pass");
            current = next;
            if settled {
                check_labels(method, &current)?;
                debug!(passes = pass, hoisted = hoisted.len(), "lowering settled");
                return Ok((current, hoisted));
            }
        }
        Err(LowerError::FixedPointNotReached {
            method: method.to_string(),
            passes: self.options.max_passes,
        })
    }
}

fn check_labels(method: &str, body: &BoundStatement) -> Result<(), LowerError> {
    let BoundStatement::Block(statements) = body else {
        return Ok(());
    };
    let declared: FxHashSet<&LabelSymbol> = statements
        .iter()
        .filter_map(|statement| match statement {
            BoundStatement::Label(label) => Some(label),
            _ => None,
        })
        .collect();
    let undeclared = statements.iter().find_map(|statement| match statement {
        BoundStatement::Goto(label) | BoundStatement::ConditionalGoto { label, .. } if !declared.contains(label) => {
            Some(label)
        }
        _ => None,
    });
    undeclared.map_or(Ok(()), |label| {
        Err(LowerError::UndeclaredLabel {
            method: method.to_string(),
            label: label.name.clone(),
        })
    })
}

/// Lowers `program` with a fresh context seeded from its label allocator
///
/// # Errors
///
/// See [`LoweringContext::lower_program`].
pub fn lower(program: &BoundProgram, options: LowerOptions) -> Result<LoweredProgram, LowerError> {
    LoweringContext::new(options, program.labels.clone()).lower_program(program)
}
