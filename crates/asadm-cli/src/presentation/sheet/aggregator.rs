//! Per-group reductions shown on a sheet's aggregate line.

use super::decl::{ConvertFn, EntryData};
use asadm_types::{Scalar, ValueCell};
use std::fmt;

pub type ReduceFn = dyn Fn(&[&Scalar]) -> Option<Scalar> + Send + Sync;

pub enum Reduction {
    Sum,
    Min,
    Max,
    Avg,
    Count,
    Custom(Box<ReduceFn>),
}

impl fmt::Debug for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reduction::Sum => write!(f, "Sum"),
            Reduction::Min => write!(f, "Min"),
            Reduction::Max => write!(f, "Max"),
            Reduction::Avg => write!(f, "Avg"),
            Reduction::Count => write!(f, "Count"),
            Reduction::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// A reduction plus an optional converter for its result. Without one the
/// field's own converter is used.
pub struct Aggregator {
    pub reduction: Reduction,
    pub converter: Option<Box<ConvertFn>>,
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("reduction", &self.reduction)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

impl Aggregator {
    pub fn new(reduction: Reduction) -> Self {
        Self {
            reduction,
            converter: None,
        }
    }

    pub fn sum() -> Self {
        Self::new(Reduction::Sum)
    }

    pub fn min() -> Self {
        Self::new(Reduction::Min)
    }

    pub fn max() -> Self {
        Self::new(Reduction::Max)
    }

    pub fn avg() -> Self {
        Self::new(Reduction::Avg)
    }

    pub fn count() -> Self {
        Self::new(Reduction::Count)
    }

    pub fn custom<F>(reduce: F) -> Self
    where
        F: Fn(&[&Scalar]) -> Option<Scalar> + Send + Sync + 'static,
    {
        Self::new(Reduction::Custom(Box::new(reduce)))
    }

    pub fn converter<C>(mut self, converter: C) -> Self
    where
        C: Fn(&EntryData<'_>) -> String + Send + Sync + 'static,
    {
        self.converter = Some(Box::new(converter));
        self
    }

    /// Reduce one group. Absent entries are skipped; any error poisons the
    /// result; nothing left to reduce is absent.
    pub fn aggregate(&self, group: &[ValueCell<Scalar>]) -> ValueCell<Scalar> {
        if let Some(cause) = group.iter().find_map(|cell| match cell {
            ValueCell::Error(cause) => Some(cause.clone()),
            _ => None,
        }) {
            return ValueCell::Error(cause);
        }

        let values: Vec<&Scalar> = group.iter().filter_map(ValueCell::value).collect();
        if values.is_empty() {
            return ValueCell::Absent;
        }

        let result = match &self.reduction {
            Reduction::Sum => sum(&values),
            Reduction::Min => values.iter().min().map(|v| (*v).clone()),
            Reduction::Max => values.iter().max().map(|v| (*v).clone()),
            Reduction::Avg => sum(&values)
                .and_then(|total| total.as_f64())
                .map(|total| Scalar::Float(total / values.len() as f64)),
            Reduction::Count => Some(Scalar::from(values.len())),
            Reduction::Custom(reduce) => reduce(&values),
        };

        match result {
            Some(value) => ValueCell::Value(value),
            None => ValueCell::Error("cannot aggregate non-numeric values".to_string()),
        }
    }
}

/// Integers stay integers until a float joins in.
fn sum(values: &[&Scalar]) -> Option<Scalar> {
    let mut total = Scalar::Int(0);

    for value in values {
        total = match (total, *value) {
            (Scalar::Int(a), Scalar::Int(b)) => Scalar::Int(a.checked_add(*b)?),
            (acc, value) if value.is_number() => Scalar::Float(acc.as_f64()? + value.as_f64()?),
            _ => return None,
        };
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<ValueCell<Scalar>> {
        values.iter().map(|v| ValueCell::Value(Scalar::Int(*v))).collect()
    }

    #[test]
    fn test_sum_skips_absent() {
        let group = vec![
            ValueCell::Value(Scalar::Int(3)),
            ValueCell::Absent,
            ValueCell::Value(Scalar::Int(5)),
        ];
        assert_eq!(Aggregator::sum().aggregate(&group), ValueCell::Value(Scalar::Int(8)));
    }

    #[test]
    fn test_error_poisons_aggregate() {
        let group = vec![ValueCell::Value(Scalar::Int(3)), ValueCell::error("timeout")];
        assert_eq!(
            Aggregator::sum().aggregate(&group),
            ValueCell::Error("timeout".to_string())
        );
        assert!(Aggregator::count().aggregate(&group).is_error());
    }

    #[test]
    fn test_all_absent_is_absent() {
        let group = vec![ValueCell::Absent, ValueCell::Absent];
        assert!(Aggregator::max().aggregate(&group).is_absent());
        assert!(Aggregator::sum().aggregate(&[]).is_absent());
    }

    #[test]
    fn test_mixed_number_kinds() {
        let group = vec![ValueCell::Value(Scalar::Int(1)), ValueCell::Value(Scalar::Float(0.5))];
        assert_eq!(Aggregator::sum().aggregate(&group), ValueCell::Value(Scalar::Float(1.5)));
        assert_eq!(Aggregator::max().aggregate(&group), ValueCell::Value(Scalar::Int(1)));
        assert_eq!(Aggregator::min().aggregate(&group), ValueCell::Value(Scalar::Float(0.5)));
    }

    #[test]
    fn test_avg_and_count() {
        let group = ints(&[2, 4, 9]);
        assert_eq!(Aggregator::avg().aggregate(&group), ValueCell::Value(Scalar::Float(5.0)));
        assert_eq!(Aggregator::count().aggregate(&group), ValueCell::Value(Scalar::Int(3)));
    }

    #[test]
    fn test_sum_of_strings_is_an_error() {
        let group = vec![ValueCell::Value(Scalar::from("a"))];
        assert!(Aggregator::sum().aggregate(&group).is_error());
    }

    #[test]
    fn test_custom_reduction() {
        let any_true = Aggregator::custom(|values| {
            Some(Scalar::Bool(values.iter().any(|v| matches!(v, Scalar::Bool(true)))))
        });
        let group = vec![ValueCell::Value(Scalar::Bool(false)), ValueCell::Value(Scalar::Bool(true))];
        assert_eq!(any_true.aggregate(&group), ValueCell::Value(Scalar::Bool(true)));
    }
}
