use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Selector;

/// Typed expression tree compiled to formula text.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(from = "ExpressionRepr", into = "ExpressionRepr")]
pub enum Expression {
    Text(String),
    Number(f64),
    Boolean(bool),
    Compound {
        operator: Operator,
        items: Vec<Expression>,
    },
    Negated(Box<Expression>),
    Function {
        name: String,
        items: Vec<Expression>,
    },
    Selector(Selector),
    /// Literal formula text with `{name}` placeholders bound to selectors.
    Template {
        text: String,
        vars: BTreeMap<String, Selector>,
    },
}

/// Binary operators allowed in compound expressions.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "^")]
    Power,
    #[serde(rename = "&")]
    Concat,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<>")]
    NotEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">=")]
    GreaterOrEqual,
}

impl Operator {
    pub fn token(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Power => "^",
            Self::Concat => "&",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
        }
    }
}

// Wire shape: bare JSON literals, or objects tagged by `type`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ExpressionRepr {
    Boolean(bool),
    Number(f64),
    Text(String),
    Node(Node),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Node {
    Compound {
        with: Operator,
        items: Vec<Expression>,
    },
    Negated {
        item: Box<Expression>,
    },
    Function {
        name: String,
        #[serde(default)]
        items: Vec<Expression>,
    },
    Selector {
        from: Selector,
    },
    #[serde(alias = "raw")]
    Template {
        text: String,
        #[serde(default)]
        vars: BTreeMap<String, Selector>,
    },
}

impl From<ExpressionRepr> for Expression {
    fn from(repr: ExpressionRepr) -> Self {
        match repr {
            ExpressionRepr::Boolean(b) => Self::Boolean(b),
            ExpressionRepr::Number(n) => Self::Number(n),
            ExpressionRepr::Text(s) => Self::Text(s),
            ExpressionRepr::Node(Node::Compound { with, items }) => Self::Compound {
                operator: with,
                items,
            },
            ExpressionRepr::Node(Node::Negated { item }) => Self::Negated(item),
            ExpressionRepr::Node(Node::Function { name, items }) => Self::Function { name, items },
            ExpressionRepr::Node(Node::Selector { from }) => Self::Selector(from),
            ExpressionRepr::Node(Node::Template { text, vars }) => Self::Template { text, vars },
        }
    }
}

impl From<Expression> for ExpressionRepr {
    fn from(expression: Expression) -> Self {
        match expression {
            Expression::Boolean(b) => Self::Boolean(b),
            Expression::Number(n) => Self::Number(n),
            Expression::Text(s) => Self::Text(s),
            Expression::Compound { operator, items } => Self::Node(Node::Compound {
                with: operator,
                items,
            }),
            Expression::Negated(item) => Self::Node(Node::Negated { item }),
            Expression::Function { name, items } => Self::Node(Node::Function { name, items }),
            Expression::Selector(from) => Self::Node(Node::Selector { from }),
            Expression::Template { text, vars } => Self::Node(Node::Template { text, vars }),
        }
    }
}
