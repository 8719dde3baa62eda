//! Text rendering of bound trees
//!
//! Statements render one per line with four-space indentation for nested
//! bodies. The same text feeds snapshot tests and control flow graph labels.

use crate::tree::{BoundExpression, BoundMethod, BoundStatement};
use ql_symbols::ConstValue;
use std::fmt;

const INDENT: &str = "    ";

fn write_operand(formatter: &mut fmt::Formatter<'_>, operand: &BoundExpression) -> fmt::Result {
    match operand {
        BoundExpression::Binary { .. } | BoundExpression::Assignment { .. } | BoundExpression::IndexAssignment { .. } => {
            write!(formatter, "({operand})")
        }
        _ => write!(formatter, "{operand}"),
    }
}

fn write_arguments(formatter: &mut fmt::Formatter<'_>, arguments: &[BoundExpression]) -> fmt::Result {
    formatter.write_str("(")?;
    for (index, argument) in arguments.iter().enumerate() {
        if index > 0 {
            formatter.write_str(", ")?;
        }
        write!(formatter, "{argument}")?;
    }
    formatter.write_str(")")
}

impl fmt::Display for BoundExpression {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => formatter.write_str("?"),
            Self::Literal(ConstValue::String(value)) => write!(formatter, "{value:?}"),
            Self::Literal(ConstValue::Char(value)) => write!(formatter, "{value:?}"),
            Self::Literal(value) => write!(formatter, "{value}"),
            Self::Variable(variable) => formatter.write_str(&variable.name),
            Self::Assignment { variable, value } => write!(formatter, "{} = {value}", variable.name),
            Self::Unary { operator, operand } => {
                formatter.write_str(operator.syntax)?;
                write_operand(formatter, operand)
            }
            Self::Binary { left, operator, right } => {
                write_operand(formatter, left)?;
                write!(formatter, " {} ", operator.syntax)?;
                write_operand(formatter, right)
            }
            Self::Call { method, arguments } => {
                formatter.write_str(&method.qualified_name())?;
                write_arguments(formatter, arguments)
            }
            Self::MemberCall {
                receiver,
                method,
                arguments,
            } => {
                write_operand(formatter, receiver)?;
                write!(formatter, ".{}", method.name)?;
                write_arguments(formatter, arguments)
            }
            Self::Index { receiver, index, .. } => {
                write_operand(formatter, receiver)?;
                write!(formatter, "[{index}]")
            }
            Self::IndexAssignment {
                receiver,
                index,
                operator,
                value,
                ..
            } => {
                write_operand(formatter, receiver)?;
                let syntax = operator.as_ref().map_or("", |operator| operator.syntax);
                write!(formatter, "[{index}] {syntax}= {value}")
            }
            Self::Conversion { ty, operand } => write!(formatter, "{ty}({operand})"),
            Self::ArrayCreation { ty, size } => write!(formatter, "new {ty}({size})"),
        }
    }
}

/// Writes `statement` starting at `depth`, every line newline-terminated
fn write_statement(formatter: &mut fmt::Formatter<'_>, statement: &BoundStatement, depth: usize) -> fmt::Result {
    let indent = INDENT.repeat(depth);
    match statement {
        BoundStatement::Block(statements) => {
            writeln!(formatter, "{indent}{{")?;
            for inner in statements {
                write_statement(formatter, inner, depth + 1)?;
            }
            writeln!(formatter, "{indent}}}")
        }
        BoundStatement::VariableDeclaration { variable, initializer } => {
            let keyword = if variable.read_only { "let" } else { "var" };
            writeln!(formatter, "{indent}{keyword} {} = {initializer}", variable.name)
        }
        BoundStatement::Expression(expression) => writeln!(formatter, "{indent}{expression}"),
        BoundStatement::If {
            condition,
            then_statement,
            else_statement,
        } => {
            writeln!(formatter, "{indent}if {condition}")?;
            write_body(formatter, then_statement, depth)?;
            if let Some(else_statement) = else_statement {
                writeln!(formatter, "{indent}else")?;
                write_body(formatter, else_statement, depth)?;
            }
            Ok(())
        }
        BoundStatement::While { condition, body, .. } => {
            writeln!(formatter, "{indent}while {condition}")?;
            write_body(formatter, body, depth)
        }
        BoundStatement::DoWhile { body, condition, .. } => {
            writeln!(formatter, "{indent}do")?;
            write_body(formatter, body, depth)?;
            writeln!(formatter, "{indent}while {condition}")
        }
        BoundStatement::For {
            initializer,
            condition,
            update,
            body,
            ..
        } => {
            write!(formatter, "{indent}for (")?;
            if let Some(initializer) = initializer {
                let text = initializer.to_string();
                formatter.write_str(text.trim())?;
            }
            formatter.write_str("; ")?;
            if let Some(condition) = condition {
                write!(formatter, "{condition}")?;
            }
            formatter.write_str("; ")?;
            if let Some(update) = update {
                write!(formatter, "{update}")?;
            }
            writeln!(formatter, ")")?;
            write_body(formatter, body, depth)
        }
        BoundStatement::Label(label) => writeln!(formatter, "{label}:"),
        BoundStatement::Goto(label) => writeln!(formatter, "{indent}goto {label}"),
        BoundStatement::ConditionalGoto {
            label,
            condition,
            jump_if_true,
        } => {
            let keyword = if *jump_if_true { "if" } else { "unless" };
            writeln!(formatter, "{indent}goto {label} {keyword} {condition}")
        }
        BoundStatement::Return(Some(value)) => writeln!(formatter, "{indent}return {value}"),
        BoundStatement::Return(None) => writeln!(formatter, "{indent}return"),
        BoundStatement::MethodDeclaration(method) => {
            writeln!(formatter, "{indent}method {}", method.symbol)?;
            write_body(formatter, &method.body, depth)
        }
        BoundStatement::Nop => writeln!(formatter, "{indent}nop"),
    }
}

/// Blocks stay at the owner's depth, single statements indent one level
fn write_body(formatter: &mut fmt::Formatter<'_>, body: &BoundStatement, depth: usize) -> fmt::Result {
    match body {
        BoundStatement::Block(_) => write_statement(formatter, body, depth),
        _ => write_statement(formatter, body, depth + 1),
    }
}

impl fmt::Display for BoundStatement {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statement(formatter, self, 0)
    }
}

impl fmt::Display for BoundMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "{}", self.symbol)?;
        write_statement(formatter, &self.body, 0)
    }
}
