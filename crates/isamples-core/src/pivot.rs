//! Facet-pivot materialization.
//!
//! Turns the nested tree returned for a Solr `facet.pivot` request into a
//! dense N-dimensional count array with one axis per requested dimension.
//!
//! # Algorithm
//!
//! 1. Every facet value is normalized (trimmed, lower-cased) before it is
//!    used as a coordinate, so `"Rock"` and `" rock "` share one index.
//! 2. A single depth-first pre-order walk validates each node against the
//!    dimension expected at its depth, appends unseen values to that
//!    dimension's coordinate list (first-seen order), and buffers every
//!    leaf's `(index tuple, count)`.
//! 3. Once the walk finishes, the coordinate lists are final. The array is
//!    allocated with shape `[len(coords[d]) for d in dimensions]` and the
//!    buffered leaf counts are summed into their cells.
//!
//! The index tuple travels down the recursion by value, so siblings never
//! observe a previous sibling's partial path. Nothing is allocated until
//! the whole tree validated, so an error never yields a partial table.

use std::collections::HashMap;

use ndarray::{ArrayD, ArrayViewD, Axis, Dimension, IxDyn};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::models::FacetPivotNode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PivotError {
    /// The request itself is unusable (e.g. fewer than two dimensions).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The pivot tree does not match the requested dimensions.
    #[error("malformed pivot input: {0}")]
    MalformedInput(String),
}

/// Normalize a raw facet value into a coordinate key.
///
/// Trims surrounding whitespace and lower-cases. Idempotent.
///
/// The ASCII information separators U+001C..=U+001F are trimmed along with
/// Unicode whitespace.
pub fn normalize_facet(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c))
        .to_lowercase()
}

/// Key under which Solr reports a pivot: the dimension names joined by
/// literal commas, no spaces.
pub fn pivot_key<S: AsRef<str>>(dimensions: &[S]) -> String {
    dimensions
        .iter()
        .map(|d| d.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

/// Pull the pivot node list for `dimensions` out of a full select response.
///
/// Looks under `facet_counts.facet_pivot.<pivot_key>`. Any missing level
/// yields an empty list; a present entry that is not a valid node array
/// is [`PivotError::MalformedInput`].
pub fn extract_pivot_nodes<S: AsRef<str>>(
    response: &Value,
    dimensions: &[S],
) -> Result<Vec<FacetPivotNode>, PivotError> {
    let key = pivot_key(dimensions);
    let entry = response
        .get("facet_counts")
        .and_then(|f| f.get("facet_pivot"))
        .and_then(|p| p.get(&key));

    match entry {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => Vec::<FacetPivotNode>::deserialize(v).map_err(|e| {
            PivotError::MalformedInput(format!("facet_pivot entry '{}': {}", key, e))
        }),
    }
}

/// Distinct normalized values of one dimension, in first-seen order.
#[derive(Debug, Clone, Default)]
struct CoordinateIndex {
    values: Vec<String>,
    positions: HashMap<String, usize>,
}

impl CoordinateIndex {
    fn intern(&mut self, value: String) -> usize {
        if let Some(&pos) = self.positions.get(&value) {
            return pos;
        }
        let pos = self.values.len();
        self.positions.insert(value.clone(), pos);
        self.values.push(value);
        pos
    }

    fn position(&self, value: &str) -> Option<usize> {
        self.positions.get(value).copied()
    }
}

/// Labeled dense count array produced by [`materialize_pivot`].
#[derive(Debug, Clone)]
pub struct PivotTable {
    dimensions: Vec<String>,
    coords: Vec<CoordinateIndex>,
    values: ArrayD<u64>,
}

impl PivotTable {
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Coordinate labels for `dimension`, in axis order.
    pub fn coordinates(&self, dimension: &str) -> Option<&[String]> {
        self.dimensions
            .iter()
            .position(|d| d == dimension)
            .map(|i| self.coords[i].values.as_slice())
    }

    /// `(dimension, coordinates)` pairs in dimension order.
    pub fn coordinate_map(&self) -> Vec<(&str, &[String])> {
        self.dimensions
            .iter()
            .zip(&self.coords)
            .map(|(d, c)| (d.as_str(), c.values.as_slice()))
            .collect()
    }

    pub fn values(&self) -> &ArrayD<u64> {
        &self.values
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    /// Sum of all cells. Fits in `u64`: [`materialize_pivot`] rejects
    /// trees whose leaf counts overflow in aggregate.
    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }

    /// Look up a cell by its labels, one per dimension.
    ///
    /// Labels are normalized first, so raw server values work as keys.
    pub fn count(&self, labels: &[&str]) -> Option<u64> {
        if labels.len() != self.dimensions.len() {
            return None;
        }
        let idx = labels
            .iter()
            .zip(&self.coords)
            .map(|(label, coord)| coord.position(&normalize_facet(label)))
            .collect::<Option<Vec<usize>>>()?;
        self.values.get(IxDyn(&idx)).copied()
    }

    /// Non-zero cells in row-major order, with their labels.
    pub fn nonzero_cells(&self) -> impl Iterator<Item = (Vec<&str>, u64)> + '_ {
        self.values
            .indexed_iter()
            .filter(|&(_, &v)| v > 0)
            .map(move |(idx, &v)| {
                let labels = idx
                    .slice()
                    .iter()
                    .zip(&self.coords)
                    .map(|(&i, coord)| coord.values[i].as_str())
                    .collect();
                (labels, v)
            })
    }

    /// JSON form: `{"dims", "coords", "shape", "values"}` with `values` as
    /// nested arrays in axis order.
    pub fn to_json(&self) -> Value {
        let mut coords = Map::new();
        for (dim, values) in self.coordinate_map() {
            coords.insert(dim.to_string(), json!(values));
        }
        json!({
            "dims": self.dimensions,
            "coords": Value::Object(coords),
            "shape": self.shape(),
            "values": nested_values(self.values.view()),
        })
    }
}

impl Serialize for PivotTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn nested_values(view: ArrayViewD<'_, u64>) -> Value {
    if view.ndim() <= 1 {
        return Value::Array(view.iter().map(|&v| Value::from(v)).collect());
    }
    Value::Array(view.axis_iter(Axis(0)).map(nested_values).collect())
}

struct PivotWalk<'a> {
    dimensions: &'a [String],
    coords: Vec<CoordinateIndex>,
    leaves: Vec<(Vec<usize>, u64)>,
}

impl PivotWalk<'_> {
    fn visit(
        &mut self,
        nodes: &[FacetPivotNode],
        depth: usize,
        prefix: &[usize],
    ) -> Result<(), PivotError> {
        let dimensions = self.dimensions;
        let expected = &dimensions[depth];
        let last = dimensions.len() - 1;

        for node in nodes {
            if &node.field != expected {
                return Err(PivotError::MalformedInput(format!(
                    "node '{}' at depth {} has field '{}', expected '{}'",
                    node.value, depth, node.field, expected
                )));
            }

            let pos = self.coords[depth].intern(normalize_facet(&node.value));
            let mut path = Vec::with_capacity(depth + 1);
            path.extend_from_slice(prefix);
            path.push(pos);

            if depth == last {
                if !node.is_leaf() {
                    return Err(PivotError::MalformedInput(format!(
                        "node '{}' for last dimension '{}' has {} children",
                        node.value,
                        expected,
                        node.children.len()
                    )));
                }
                self.leaves.push((path, node.count));
            } else if !node.is_leaf() {
                self.visit(&node.children, depth + 1, &path)?;
            }
            // A childless node above the last dimension is a rollup with
            // no leaf to land in: it contributes nothing.
        }
        Ok(())
    }
}

/// Materialize a facet-pivot tree into a dense labeled count array.
///
/// `roots` are the top-level nodes (field `dimensions[0]`); each level of
/// children belongs to the next dimension. Only leaf counts (nodes of the
/// last dimension) are summed into cells.
///
/// # Errors
///
/// - [`PivotError::InvalidArgument`] for fewer than two dimensions or a
///   repeated dimension name.
/// - [`PivotError::MalformedInput`] when a node's field does not match the
///   dimension for its depth, a last-dimension node has children, or the
///   summed leaf counts overflow `u64`.
pub fn materialize_pivot<S: AsRef<str>>(
    roots: &[FacetPivotNode],
    dimensions: &[S],
) -> Result<PivotTable, PivotError> {
    let dimensions: Vec<String> = dimensions.iter().map(|d| d.as_ref().to_string()).collect();

    if dimensions.len() < 2 {
        return Err(PivotError::InvalidArgument(format!(
            "at least two dimensions required for pivot, got {}",
            dimensions.len()
        )));
    }
    for (i, d) in dimensions.iter().enumerate() {
        if dimensions[..i].contains(d) {
            return Err(PivotError::InvalidArgument(format!(
                "dimension '{}' requested more than once",
                d
            )));
        }
    }

    let mut walk = PivotWalk {
        dimensions: &dimensions,
        coords: vec![CoordinateIndex::default(); dimensions.len()],
        leaves: Vec::new(),
    };
    walk.visit(roots, 0, &[])?;

    let PivotWalk { coords, leaves, .. } = walk;
    // Bounding the grand total bounds every cell and every row or column
    // total taken over the table.
    leaves
        .iter()
        .try_fold(0u64, |acc, (_, count)| acc.checked_add(*count))
        .ok_or_else(|| PivotError::MalformedInput("total leaf count overflows u64".to_string()))?;

    let shape: Vec<usize> = coords.iter().map(|c| c.values.len()).collect();
    let mut values = ArrayD::<u64>::zeros(IxDyn(&shape));

    for (path, count) in leaves {
        let cell = &mut values[IxDyn(&path)];
        *cell = cell.checked_add(count).ok_or_else(|| {
            PivotError::MalformedInput(format!("count overflow at cell {:?}", path))
        })?;
    }

    Ok(PivotTable {
        dimensions,
        coords,
        values,
    })
}


#[cfg(test)]
mod proptests {
    use super::tests::leaf_sum;
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    const DIMS: [&str; 4] = ["source", "material", "context", "registrant"];
    const BASES: [&str; 5] = ["Rock", "soil", "EARTH", "Marine", "sesar"];

    /// A facet label drawn from a small pool, in one of several spellings
    /// that all normalize to the same coordinate.
    fn label() -> impl Strategy<Value = String> {
        (prop::sample::select(BASES.to_vec()), 0u8..4).prop_map(|(base, variant)| match variant {
            0 => base.to_string(),
            1 => base.to_uppercase(),
            2 => base.to_lowercase(),
            _ => format!("  {}\t", base),
        })
    }

    /// Nodes for dimension `depth` of an `ndims`-deep pivot.
    fn level(depth: usize, ndims: usize) -> BoxedStrategy<Vec<FacetPivotNode>> {
        let field = DIMS[depth];
        if depth == ndims - 1 {
            prop::collection::vec((label(), 0u64..1000), 0..4)
                .prop_map(move |leaves| {
                    leaves
                        .into_iter()
                        .map(|(value, count)| FacetPivotNode::new(field, value, count))
                        .collect()
                })
                .boxed()
        } else {
            prop::collection::vec((label(), level(depth + 1, ndims)), 0..4)
                .prop_map(move |nodes| {
                    nodes
                        .into_iter()
                        .map(|(value, children)| {
                            let count = children.iter().map(|c| c.count).sum();
                            FacetPivotNode::new(field, value, count).with_children(children)
                        })
                        .collect()
                })
                .boxed()
        }
    }

    fn pivot_tree() -> impl Strategy<Value = (usize, Vec<FacetPivotNode>)> {
        (2usize..=4).prop_flat_map(|ndims| (Just(ndims), level(0, ndims)))
    }

    fn distinct_values(nodes: &[FacetPivotNode], depth: usize, seen: &mut Vec<HashSet<String>>) {
        for node in nodes {
            seen[depth].insert(normalize_facet(&node.value));
            distinct_values(&node.children, depth + 1, seen);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_counts_are_conserved((ndims, roots) in pivot_tree()) {
            let table = materialize_pivot(&roots, &DIMS[..ndims]).unwrap();
            prop_assert_eq!(table.total(), leaf_sum(&roots, 0, ndims - 1));
        }

        #[test]
        fn prop_shape_is_distinct_normalized_values((ndims, roots) in pivot_tree()) {
            let table = materialize_pivot(&roots, &DIMS[..ndims]).unwrap();

            let mut seen = vec![HashSet::new(); ndims];
            distinct_values(&roots, 0, &mut seen);
            let expected: Vec<usize> = seen.iter().map(|s| s.len()).collect();
            prop_assert_eq!(table.shape(), expected.as_slice());

            for (dim, coords) in table.coordinate_map() {
                for value in coords {
                    prop_assert_eq!(&normalize_facet(value), value, "dimension {}", dim);
                }
            }
        }

        #[test]
        fn prop_repeated_runs_are_identical((ndims, roots) in pivot_tree()) {
            let first = materialize_pivot(&roots, &DIMS[..ndims]).unwrap();
            let second = materialize_pivot(&roots, &DIMS[..ndims]).unwrap();
            prop_assert_eq!(first.values(), second.values());
            prop_assert_eq!(first.coordinate_map(), second.coordinate_map());
            prop_assert_eq!(first.to_json(), second.to_json());
        }

        #[test]
        fn prop_normalize_is_idempotent(raw in "[ \\tA-Za-z0-9\\x{1c}-\\x{1f}]{0,16}") {
            let once = normalize_facet(&raw);
            prop_assert_eq!(normalize_facet(&once), once.clone());
            let respelled = format!(" {}\t", raw.to_uppercase());
            prop_assert_eq!(normalize_facet(&respelled), once);
        }
    }
}
