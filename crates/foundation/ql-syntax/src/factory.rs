//! Builders for well-shaped syntax trees
//!
//! Every node built by one factory gets its own span, so diagnostics reported
//! against different nodes never collide.

use crate::{SyntaxKind, SyntaxNode, SyntaxTree};
use ql_span::Span;
use std::cell::Cell;

/// Creates syntax nodes in the shapes the binder expects
#[derive(Debug, Default)]
pub struct SyntaxFactory {
    next_offset: Cell<u32>,
}

impl SyntaxFactory {
    /// Creates a factory whose first node starts at offset 0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node of any kind with a fresh span
    pub fn node(&self, kind: SyntaxKind, text: impl Into<String>, children: Vec<SyntaxNode>) -> SyntaxNode {
        let start = self.next_offset.get();
        self.next_offset.set(start + 1);
        SyntaxNode::new(kind, Span::new(start, start + 1), text, children)
    }

    fn leaf(&self, kind: SyntaxKind, text: impl Into<String>) -> SyntaxNode {
        self.node(kind, text, Vec::new())
    }

    /// Wraps members into a compilation unit tree
    pub fn tree(&self, members: Vec<SyntaxNode>) -> SyntaxTree {
        SyntaxTree::new(self.node(SyntaxKind::CompilationUnit, "", members))
    }

    // Declarations

    /// `name(params) : return_type { body }`
    pub fn method(
        &self,
        name: &str,
        parameters: Vec<(&str, SyntaxNode)>,
        return_type: Option<SyntaxNode>,
        body: SyntaxNode,
    ) -> SyntaxNode {
        let parameters = parameters
            .into_iter()
            .map(|(parameter, ty)| self.node(SyntaxKind::Parameter, parameter, vec![ty]))
            .collect();
        let mut children = vec![self.node(SyntaxKind::ParameterList, "", parameters)];
        if let Some(ty) = return_type {
            children.push(self.node(SyntaxKind::ReturnType, "", vec![ty]));
        }
        children.push(body);
        self.node(SyntaxKind::MethodDeclaration, name, children)
    }

    /// `namespace name { members }`
    pub fn namespace(&self, name: &str, members: Vec<SyntaxNode>) -> SyntaxNode {
        self.node(SyntaxKind::NamespaceDeclaration, name, members)
    }

    /// `with namespace;`
    pub fn with_directive(&self, namespace: &str) -> SyntaxNode {
        self.leaf(SyntaxKind::WithDirective, namespace)
    }

    /// `with alias = namespace;`
    pub fn with_alias(&self, alias: &str, namespace: &str) -> SyntaxNode {
        let alias = self.leaf(SyntaxKind::Alias, alias);
        self.node(SyntaxKind::WithDirective, namespace, vec![alias])
    }

    // Types

    /// A non-generic type reference
    pub fn type_name(&self, name: &str) -> SyntaxNode {
        self.leaf(SyntaxKind::TypeName, name)
    }

    /// A generic type reference such as `Array<int>`
    pub fn generic_type(&self, name: &str, arguments: Vec<SyntaxNode>) -> SyntaxNode {
        self.node(SyntaxKind::GenericTypeName, name, arguments)
    }

    // Statements

    /// `{ statements }`
    pub fn block(&self, statements: Vec<SyntaxNode>) -> SyntaxNode {
        self.node(SyntaxKind::Block, "", statements)
    }

    /// `var name = initializer;`
    pub fn variable(&self, name: &str, initializer: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::VariableDeclaration, name, vec![initializer])
    }

    /// `var name: ty = initializer;`
    pub fn typed_variable(&self, name: &str, ty: SyntaxNode, initializer: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::VariableDeclaration, name, vec![ty, initializer])
    }

    /// `const name = initializer;`
    pub fn constant(&self, name: &str, initializer: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::ConstantDeclaration, name, vec![initializer])
    }

    /// `expression;`
    pub fn expression_statement(&self, expression: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::ExpressionStatement, "", vec![expression])
    }

    /// `if (condition) then_statement [else else_statement]`
    pub fn if_statement(
        &self,
        condition: SyntaxNode,
        then_statement: SyntaxNode,
        else_statement: Option<SyntaxNode>,
    ) -> SyntaxNode {
        let mut children = vec![condition, then_statement];
        children.extend(else_statement);
        self.node(SyntaxKind::IfStatement, "", children)
    }

    /// `while (condition) body`
    pub fn while_statement(&self, condition: SyntaxNode, body: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::WhileStatement, "", vec![condition, body])
    }

    /// `do body while (condition);`
    pub fn do_while_statement(&self, body: SyntaxNode, condition: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::DoWhileStatement, "", vec![body, condition])
    }

    /// `for (initializer; condition; update) body`
    pub fn for_statement(
        &self,
        initializer: Option<SyntaxNode>,
        condition: Option<SyntaxNode>,
        update: Option<SyntaxNode>,
        body: SyntaxNode,
    ) -> SyntaxNode {
        let initializer = self.node(SyntaxKind::ForInitializer, "", initializer.into_iter().collect());
        let condition = self.node(SyntaxKind::ForCondition, "", condition.into_iter().collect());
        let update = self.node(SyntaxKind::ForUpdate, "", update.into_iter().collect());
        self.node(SyntaxKind::ForStatement, "", vec![initializer, condition, update, body])
    }

    /// `break;`
    pub fn break_statement(&self) -> SyntaxNode {
        self.leaf(SyntaxKind::BreakStatement, "break")
    }

    /// `continue;`
    pub fn continue_statement(&self) -> SyntaxNode {
        self.leaf(SyntaxKind::ContinueStatement, "continue")
    }

    /// `return [value];`
    pub fn return_statement(&self, value: Option<SyntaxNode>) -> SyntaxNode {
        self.node(SyntaxKind::ReturnStatement, "return", value.into_iter().collect())
    }

    /// `name:`
    pub fn label(&self, name: &str) -> SyntaxNode {
        self.leaf(SyntaxKind::LabelStatement, name)
    }

    /// `goto name;`
    pub fn goto(&self, name: &str) -> SyntaxNode {
        self.leaf(SyntaxKind::GotoStatement, name)
    }

    // Expressions

    /// Integer literal
    pub fn int(&self, value: i64) -> SyntaxNode {
        self.leaf(SyntaxKind::IntegerLiteral, value.to_string())
    }

    /// Float literal
    pub fn float(&self, value: f64) -> SyntaxNode {
        self.leaf(SyntaxKind::FloatLiteral, format!("{value:?}"))
    }

    /// String literal holding `value`
    pub fn string(&self, value: &str) -> SyntaxNode {
        self.leaf(SyntaxKind::StringLiteral, value)
    }

    /// Character literal
    pub fn char(&self, value: char) -> SyntaxNode {
        self.leaf(SyntaxKind::CharLiteral, value.to_string())
    }

    /// `true` or `false`
    pub fn boolean(&self, value: bool) -> SyntaxNode {
        self.leaf(SyntaxKind::BooleanLiteral, value.to_string())
    }

    /// Identifier
    pub fn name(&self, name: &str) -> SyntaxNode {
        self.leaf(SyntaxKind::NameExpression, name)
    }

    /// `(inner)`
    pub fn parenthesized(&self, inner: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::ParenthesizedExpression, "", vec![inner])
    }

    /// Prefix operator application
    pub fn unary(&self, operator: &str, operand: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::UnaryExpression, operator, vec![operand])
    }

    /// Infix operator application
    pub fn binary(&self, left: SyntaxNode, operator: &str, right: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::BinaryExpression, operator, vec![left, right])
    }

    /// `target = value`
    pub fn assignment(&self, target: SyntaxNode, value: SyntaxNode) -> SyntaxNode {
        self.compound_assignment(target, "=", value)
    }

    /// `target op= value`, `operator` includes the trailing `=`
    pub fn compound_assignment(&self, target: SyntaxNode, operator: &str, value: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::AssignmentExpression, operator, vec![target, value])
    }

    /// `callee(arguments)` for a bare method name
    pub fn call(&self, name: &str, arguments: Vec<SyntaxNode>) -> SyntaxNode {
        let callee = self.name(name);
        self.call_on(callee, arguments)
    }

    /// `callee(arguments)` for any callee expression
    pub fn call_on(&self, callee: SyntaxNode, arguments: Vec<SyntaxNode>) -> SyntaxNode {
        let arguments = self.node(SyntaxKind::ArgumentList, "", arguments);
        self.node(SyntaxKind::CallExpression, "", vec![callee, arguments])
    }

    /// `target.member`
    pub fn member_access(&self, target: SyntaxNode, member: &str) -> SyntaxNode {
        self.node(SyntaxKind::MemberAccessExpression, member, vec![target])
    }

    /// Dotted path such as `Geo.Shapes.area`, built from member accesses
    pub fn qualified_name(&self, path: &str) -> SyntaxNode {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        segments.fold(self.name(first), |target, segment| self.member_access(target, segment))
    }

    /// `target[index]`
    pub fn element_access(&self, target: SyntaxNode, index: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::ElementAccessExpression, "", vec![target, index])
    }

    /// `(ty)operand`
    pub fn cast(&self, ty: SyntaxNode, operand: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::CastExpression, "", vec![ty, operand])
    }

    /// `new ty(size)`
    pub fn array_creation(&self, ty: SyntaxNode, size: SyntaxNode) -> SyntaxNode {
        self.node(SyntaxKind::ArrayCreationExpression, "new", vec![ty, size])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_are_unique() {
        let factory = SyntaxFactory::new();
        let first = factory.variable("x", factory.int(10));
        let second = factory.variable("x", factory.int(5));
        assert_ne!(first.span, second.span);
        assert_ne!(first.children[0].span, second.children[0].span);
    }

    #[test]
    fn test_for_statement_has_fixed_slots() {
        let factory = SyntaxFactory::new();
        let body = factory.block(Vec::new());
        let node = factory.for_statement(None, Some(factory.boolean(true)), None, body);
        let slots: Vec<usize> = node.children.iter().map(|child| child.children.len()).collect();
        assert_eq!(slots, vec![0, 1, 0, 0]);
    }

    #[test]
    fn test_qualified_name_nests_member_accesses() {
        let factory = SyntaxFactory::new();
        let node = factory.qualified_name("Geo.Shapes.area");
        assert_eq!(node.kind, SyntaxKind::MemberAccessExpression);
        assert_eq!(node.text, "area");
        assert_eq!(node.children[0].text, "Shapes");
        assert_eq!(node.children[0].children[0].kind, SyntaxKind::NameExpression);
    }
}
