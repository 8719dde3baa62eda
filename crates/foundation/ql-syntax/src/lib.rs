//! Syntax tree consumed by the binder
//!
//! Lexing and parsing live outside this workspace. A parser hands the binder
//! one [`SyntaxTree`] per compilation unit; every node carries a [`SyntaxKind`]
//! tag, its source span, the token text that matters for the kind (names,
//! operators, literal lexemes) and its ordered children. [`SyntaxFactory`]
//! builds well-shaped trees without a parser.

mod factory;

pub use factory::SyntaxFactory;

use ql_span::{SourceText, Span};
use std::fmt;
use std::sync::Arc;

/// Generic syntax tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// The kind of this node
    pub kind: SyntaxKind,
    /// Source location
    pub span: Span,
    /// Source text (for names, operators and literals)
    pub text: String,
    /// Child nodes
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Creates a node
    pub fn new(kind: SyntaxKind, span: Span, text: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
            children,
        }
    }

    /// Replaces the span of this node
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Child at `index`
    pub fn child(&self, index: usize) -> Option<&Self> {
        self.children.get(index)
    }

    /// First child of the given kind
    pub fn child_of_kind(&self, kind: SyntaxKind) -> Option<&Self> {
        self.children.iter().find(|child| child.kind == kind)
    }

    /// Breadth-first walk over this node and its descendants
    pub fn descendants(&self) -> Vec<&Self> {
        let mut nodes = vec![self];
        let mut index = 0;
        while let Some(node) = nodes.get(index).copied() {
            nodes.extend(node.children.iter());
            index += 1;
        }
        nodes
    }
}

/// Node kinds of the Quill surface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    /// Root of one compilation unit
    CompilationUnit,
    /// `namespace a.b { ... }`
    NamespaceDeclaration,
    /// `with a.b;` or `with alias = a.b;`
    WithDirective,
    /// Alias name inside a with directive
    Alias,
    /// Method declaration, text is the method name
    MethodDeclaration,
    /// Parameter list of a method
    ParameterList,
    /// One parameter, text is the parameter name
    Parameter,
    /// Declared return type of a method
    ReturnType,
    /// `{ ... }`
    Block,
    /// `var name = ...;`
    VariableDeclaration,
    /// `const name = ...;`
    ConstantDeclaration,
    /// Expression used as a statement
    ExpressionStatement,
    /// `if (c) T else E`
    IfStatement,
    /// `while (c) B`
    WhileStatement,
    /// `do B while (c);`
    DoWhileStatement,
    /// `for (init; c; update) B`
    ForStatement,
    /// Optional initializer slot of a for statement
    ForInitializer,
    /// Optional condition slot of a for statement
    ForCondition,
    /// Optional update slot of a for statement
    ForUpdate,
    /// `break;`
    BreakStatement,
    /// `continue;`
    ContinueStatement,
    /// `return;` or `return e;`
    ReturnStatement,
    /// `name:`
    LabelStatement,
    /// `goto name;`
    GotoStatement,
    /// Integer literal
    IntegerLiteral,
    /// Floating-point literal
    FloatLiteral,
    /// String literal, text is the unescaped value
    StringLiteral,
    /// Character literal
    CharLiteral,
    /// `true` or `false`
    BooleanLiteral,
    /// Identifier in expression position
    NameExpression,
    /// `(e)`
    ParenthesizedExpression,
    /// Prefix operator, text is the operator
    UnaryExpression,
    /// Infix operator, text is the operator
    BinaryExpression,
    /// Simple or compound assignment, text is the operator
    AssignmentExpression,
    /// `callee(args)`
    CallExpression,
    /// Argument list of a call
    ArgumentList,
    /// `target.member`
    MemberAccessExpression,
    /// `target[index]`
    ElementAccessExpression,
    /// `(Type)e`
    CastExpression,
    /// `new Array<T>(size)`
    ArrayCreationExpression,
    /// Non-generic type reference
    TypeName,
    /// Generic type reference, children are type arguments
    GenericTypeName,
}

impl SyntaxKind {
    /// Returns true for kinds that denote expressions
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            Self::IntegerLiteral
                | Self::FloatLiteral
                | Self::StringLiteral
                | Self::CharLiteral
                | Self::BooleanLiteral
                | Self::NameExpression
                | Self::ParenthesizedExpression
                | Self::UnaryExpression
                | Self::BinaryExpression
                | Self::AssignmentExpression
                | Self::CallExpression
                | Self::MemberAccessExpression
                | Self::ElementAccessExpression
                | Self::CastExpression
                | Self::ArrayCreationExpression
        )
    }

    /// Returns true for kinds that denote type references
    pub fn is_type(self) -> bool {
        matches!(self, Self::TypeName | Self::GenericTypeName)
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, formatter)
    }
}

/// One parsed compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    /// Root node, always of kind [`SyntaxKind::CompilationUnit`]
    pub root: SyntaxNode,
    /// Originating text, when the tree came from a parser
    pub source: Option<Arc<SourceText>>,
}

impl SyntaxTree {
    /// Wraps a root node without source text
    pub fn new(root: SyntaxNode) -> Self {
        Self { root, source: None }
    }

    /// Wraps a root node parsed from `source`
    pub fn with_source(root: SyntaxNode, source: Arc<SourceText>) -> Self {
        Self {
            root,
            source: Some(source),
        }
    }

    /// Members of the compilation unit
    pub fn members(&self) -> &[SyntaxNode] {
        &self.root.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descendants_start_at_self() {
        let factory = SyntaxFactory::new();
        let expr = factory.binary(factory.int(1), "+", factory.int(2));
        let kinds: Vec<SyntaxKind> = expr.descendants().iter().map(|node| node.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::BinaryExpression,
                SyntaxKind::IntegerLiteral,
                SyntaxKind::IntegerLiteral
            ]
        );
    }

    #[test]
    fn test_kind_classification() {
        assert!(SyntaxKind::CallExpression.is_expression());
        assert!(!SyntaxKind::Block.is_expression());
        assert!(SyntaxKind::GenericTypeName.is_type());
        assert_eq!(SyntaxKind::ForUpdate.to_string(), "ForUpdate");
    }
}
