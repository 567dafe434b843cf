//! Rules: a named `when → then` pair.

use sluice_foundation::TypeTag;

use crate::error::AstError;
use crate::expr::Expression;
use crate::stmt::Statement;

/// A compiled rule.
///
/// `name` is unique within the active program; the predicate is
/// boolean-typed. Parse and link failures are represented by the
/// [`Rule::always_false`] sentinel instead of an absent rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    id: Option<String>,
    name: String,
    when: Expression,
    then: Vec<Statement>,
}

impl Rule {
    pub fn new(
        id: Option<String>,
        name: impl Into<String>,
        when: Expression,
        then: Vec<Statement>,
    ) -> Result<Self, AstError> {
        let name = name.into();
        match when.static_type() {
            TypeTag::Boolean | TypeTag::Unknown => Ok(Self {
                id,
                name,
                when,
                then,
            }),
            found => Err(AstError::NonBooleanPredicate { name, found }),
        }
    }

    /// Sentinel for rules that failed to parse or resolve. The reason
    /// becomes the rule name; the predicate never matches.
    pub fn always_false(reason: impl Into<String>) -> Self {
        Self {
            id: None,
            name: reason.into(),
            when: Expression::boolean(false),
            then: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn when(&self) -> &Expression {
        &self.when
    }

    pub fn then(&self) -> &[Statement] {
        &self.then
    }
}
