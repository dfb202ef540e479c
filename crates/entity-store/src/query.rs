use std::cmp::Ordering;

use crate::{Entity, FieldValue};

/// Comparison operators usable in a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
        }
    }

    /// The SQL spelling of this operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

/// A composable boolean predicate over the fields of an entity.
///
/// Filters are plain data so each store can evaluate them its own way:
/// in-process via [`Filter::matches`], or translated into a native query.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<F> {
    /// Matches every entity.
    All,

    /// Compares a field against a value.
    Compare {
        field: F,
        op: CompareOp,
        value: FieldValue,
    },

    /// Matches text fields containing `needle` (case-sensitive).
    Contains { field: F, needle: String },

    /// Matches when every inner filter matches. Empty matches everything.
    And(Vec<Filter<F>>),

    /// Matches when any inner filter matches. Empty matches nothing.
    Or(Vec<Filter<F>>),

    /// Inverts the inner filter.
    Not(Box<Filter<F>>),
}

impl<F> Default for Filter<F> {
    fn default() -> Self {
        Filter::All
    }
}

impl<F: Copy> Filter<F> {
    pub fn compare(field: F, op: CompareOp, value: impl Into<FieldValue>) -> Self {
        Filter::Compare {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: F, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ne(field: F, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn gt(field: F, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: F, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn lt(field: F, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: F, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    pub fn contains(field: F, needle: impl Into<String>) -> Self {
        Filter::Contains {
            field,
            needle: needle.into(),
        }
    }

    /// Combines with `other`; both must match.
    pub fn and(self, other: Filter<F>) -> Self {
        match self {
            Filter::All => other,
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            filter => Filter::And(vec![filter, other]),
        }
    }

    /// Combines with `other`; either may match.
    pub fn or(self, other: Filter<F>) -> Self {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            filter => Filter::Or(vec![filter, other]),
        }
    }

    /// Inverts this filter.
    pub fn negate(self) -> Self {
        match self {
            Filter::Not(inner) => *inner,
            filter => Filter::Not(Box::new(filter)),
        }
    }

    /// Evaluates the filter against an entity.
    ///
    /// Comparisons between incompatible value types never match.
    pub fn matches<T>(&self, entity: &T) -> bool
    where
        T: Entity<Field = F>,
    {
        match self {
            Filter::All => true,
            Filter::Compare { field, op, value } => entity
                .field(*field)
                .compare(value)
                .is_some_and(|ordering| op.holds(ordering)),
            Filter::Contains { field, needle } => entity
                .field(*field)
                .as_text()
                .is_some_and(|text| text.contains(needle.as_str())),
            Filter::And(filters) => filters.iter().all(|f| f.matches(entity)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(entity)),
            Filter::Not(inner) => !inner.matches(entity),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy<F> {
    pub field: F,
    pub direction: Direction,
}

/// Builder for bulk reads: filter, ordering and paging.
///
/// With no ordering, results come back in ascending identity order.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery<F> {
    pub filter: Filter<F>,
    pub order_by: Vec<OrderBy<F>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl<F> Default for EntityQuery<F> {
    fn default() -> Self {
        Self {
            filter: Filter::All,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

impl<F: Copy> EntityQuery<F> {
    /// Creates a query matching every entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query with the given filter.
    pub fn matching(filter: Filter<F>) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Replaces the filter.
    pub fn filter(mut self, filter: Filter<F>) -> Self {
        self.filter = filter;
        self
    }

    /// Appends an ordering key; earlier keys take precedence.
    pub fn order_by(mut self, field: F, direction: Direction) -> Self {
        self.order_by.push(OrderBy { field, direction });
        self
    }

    /// Limits the number of entities returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many entities before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Orders entities by this query's keys, falling back to identity.
    pub fn compare_entities<T>(&self, a: &T, b: &T) -> Ordering
    where
        T: Entity<Field = F>,
    {
        for key in &self.order_by {
            let ordering = a
                .field(key.field)
                .compare(&b.field(key.field))
                .unwrap_or(Ordering::Equal);
            let ordering = match key.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.id().cmp(&b.id())
    }
}
