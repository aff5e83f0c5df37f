use crate::cell::Cell;
use crate::error::{AccessError, CellError};
use crate::record::Record;
use crate::value::Value;
use sheetbake_schema::{CollectionKind, FieldDescriptor};
use std::fmt;
use std::sync::Arc;

type Getter<R> = Arc<dyn Fn(&R, &[usize]) -> Result<Value, AccessError> + Send + Sync>;
type Setter<R> = Arc<dyn Fn(&mut R, &[usize], Value) -> Result<(), AccessError> + Send + Sync>;
type Counter<R> = Arc<dyn Fn(&R, &[usize]) -> Result<usize, AccessError> + Send + Sync>;

enum Access<R> {
    Root,
    Leaf { get: Getter<R>, set: Setter<R> },
    Vertical { count: Counter<R> },
}

/// Traversal node over a record type. Leaves read and write one member; vertical nodes hold the nodes of
/// their sub-record, reached with one more index per nesting level.
pub struct PropertyNode<R> {
    path: String,
    descriptor: Option<&'static FieldDescriptor>,
    /// Number of indexes needed to address this node.
    depth: usize,
    access: Access<R>,
    children: Vec<PropertyNode<R>>,
}

fn split<'a>(path: &str, indexes: &'a [usize]) -> Result<(usize, &'a [usize]), AccessError> {
    indexes
        .split_first()
        .map(|(index, rest)| (*index, rest))
        .ok_or_else(|| AccessError::IndexDepth { path: path.to_string(), expected: 1, found: 0 })
}

impl<R: 'static> PropertyNode<R> {
    pub fn leaf(descriptor: &'static FieldDescriptor, get: fn(&R) -> Value, set: fn(&mut R, Value) -> Result<(), CellError>) -> Self {
        let path = descriptor.property_name.clone();
        let set_path = path.clone();
        PropertyNode {
            path,
            descriptor: Some(descriptor),
            depth: 0,
            access: Access::Leaf {
                get: Arc::new(move |row: &R, _indexes: &[usize]| Ok(get(row))),
                set: Arc::new(move |row: &mut R, _indexes: &[usize], value: Value| {
                    set(row, value).map_err(|source| AccessError::Cell { path: set_path.clone(), source })
                }),
            },
            children: Vec::new(),
        }
    }

    pub fn vertical<E: Record>(descriptor: &'static FieldDescriptor, items: fn(&R) -> &[E], items_mut: fn(&mut R) -> &mut [E]) -> Self {
        let path = descriptor.property_name.clone();
        let children = E::property_nodes().into_iter().map(|child| child.lift(&path, items, items_mut)).collect();
        PropertyNode {
            path,
            descriptor: Some(descriptor),
            depth: 0,
            access: Access::Vertical { count: Arc::new(move |row: &R, _indexes: &[usize]| Ok(items(row).len())) },
            children,
        }
    }

    pub fn root(name: &str, children: Vec<PropertyNode<R>>) -> Self {
        PropertyNode { path: name.to_string(), descriptor: None, depth: 0, access: Access::Root, children }
    }

    /// Re-roots this node under element `i` of a parent's vertical member, consuming one leading index.
    fn lift<P: 'static>(self, parent: &str, items: fn(&P) -> &[R], items_mut: fn(&mut P) -> &mut [R]) -> PropertyNode<P> {
        let path = format!("{parent}.{}", self.path);
        let access = match self.access {
            Access::Root => Access::Root,
            Access::Leaf { get, set } => {
                let (get_path, set_path) = (path.clone(), path.clone());
                Access::Leaf {
                    get: Arc::new(move |row: &P, indexes: &[usize]| {
                        let (index, rest) = split(&get_path, indexes)?;
                        let elements = items(row);
                        let element = elements.get(index).ok_or_else(|| AccessError::OutOfRange { path: get_path.clone(), index, len: elements.len() })?;
                        get(element, rest).map_err(|e| e.with_path(&get_path))
                    }),
                    set: Arc::new(move |row: &mut P, indexes: &[usize], value: Value| {
                        let (index, rest) = split(&set_path, indexes)?;
                        let elements = items_mut(row);
                        let len = elements.len();
                        let element = elements.get_mut(index).ok_or_else(|| AccessError::OutOfRange { path: set_path.clone(), index, len })?;
                        set(element, rest, value).map_err(|e| e.with_path(&set_path))
                    }),
                }
            }
            Access::Vertical { count } => {
                let count_path = path.clone();
                Access::Vertical {
                    count: Arc::new(move |row: &P, indexes: &[usize]| {
                        let (index, rest) = split(&count_path, indexes)?;
                        let elements = items(row);
                        let element = elements.get(index).ok_or_else(|| AccessError::OutOfRange { path: count_path.clone(), index, len: elements.len() })?;
                        count(element, rest).map_err(|e| e.with_path(&count_path))
                    }),
                }
            }
        };
        PropertyNode {
            path,
            descriptor: self.descriptor,
            depth: self.depth + 1,
            access,
            children: self.children.into_iter().map(|child| child.lift(parent, items, items_mut)).collect(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn descriptor(&self) -> Option<&'static FieldDescriptor> {
        self.descriptor
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &[PropertyNode<R>] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.access, Access::Leaf { .. })
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self.access, Access::Vertical { .. })
    }

    pub fn collection_kind(&self) -> CollectionKind {
        self.descriptor.map(|d| d.collection_kind).unwrap_or(CollectionKind::Scalar)
    }

    fn check_depth(&self, indexes: &[usize]) -> Result<(), AccessError> {
        if indexes.len() == self.depth {
            Ok(())
        } else {
            Err(AccessError::IndexDepth { path: self.path.clone(), expected: self.depth, found: indexes.len() })
        }
    }

    /// Number of elements at this node for the position given by `partial_indexes`.
    pub fn vertical_count(&self, row: &R, partial_indexes: &[usize]) -> Result<usize, AccessError> {
        self.check_depth(partial_indexes)?;
        match &self.access {
            Access::Vertical { count } => count(row, partial_indexes),
            Access::Leaf { get, .. } if self.collection_kind() != CollectionKind::Scalar => match get(row, partial_indexes)? {
                Value::List(items) => Ok(items.len()),
                Value::Map(entries) => Ok(entries.len()),
                Value::Null => Ok(0),
                _ => Err(AccessError::NotACollection { path: self.path.clone() }),
            },
            _ => Err(AccessError::NotACollection { path: self.path.clone() }),
        }
    }

    pub fn try_get_value(&self, row: &R, indexes: &[usize]) -> Result<Value, AccessError> {
        self.check_depth(indexes)?;
        match &self.access {
            Access::Leaf { get, .. } => get(row, indexes),
            _ => Err(AccessError::NotALeaf { path: self.path.clone() }),
        }
    }

    pub fn set_value(&self, row: &mut R, indexes: &[usize], value: Value) -> Result<(), AccessError> {
        self.check_depth(indexes)?;
        match &self.access {
            Access::Leaf { set, .. } => set(row, indexes, value),
            _ => Err(AccessError::NotALeaf { path: self.path.clone() }),
        }
    }

    /// Element `index` of a collection leaf; for maps the value of the `index`th entry.
    pub fn try_get_element(&self, row: &R, index: usize, partial_indexes: &[usize]) -> Result<Value, AccessError> {
        match self.try_get_value(row, partial_indexes)? {
            Value::List(mut items) => {
                let len = items.len();
                if index < len {
                    Ok(items.swap_remove(index))
                } else {
                    Err(AccessError::OutOfRange { path: self.path.clone(), index, len })
                }
            }
            Value::Map(mut entries) => {
                let len = entries.len();
                if index < len {
                    Ok(entries.swap_remove(index).1)
                } else {
                    Err(AccessError::OutOfRange { path: self.path.clone(), index, len })
                }
            }
            _ => Err(AccessError::NotACollection { path: self.path.clone() }),
        }
    }

    /// Replaces one element of a collection leaf and writes the whole collection back.
    pub fn set_element(&self, row: &mut R, index: usize, partial_indexes: &[usize], value: Value) -> Result<(), AccessError> {
        let updated = match self.try_get_value(row, partial_indexes)? {
            Value::List(mut items) => {
                let len = items.len();
                let slot = items.get_mut(index).ok_or_else(|| AccessError::OutOfRange { path: self.path.clone(), index, len })?;
                *slot = value;
                Value::List(items)
            }
            Value::Map(mut entries) => {
                let len = entries.len();
                let slot = entries.get_mut(index).ok_or_else(|| AccessError::OutOfRange { path: self.path.clone(), index, len })?;
                slot.1 = value;
                Value::Map(entries)
            }
            _ => return Err(AccessError::NotACollection { path: self.path.clone() }),
        };
        self.set_value(row, partial_indexes, updated)
    }

    /// Typed read of a leaf.
    pub fn get<T: Cell>(&self, row: &R, indexes: &[usize]) -> Result<T, AccessError> {
        let value = self.try_get_value(row, indexes)?;
        T::from_value(value).map_err(|source| AccessError::Cell { path: self.path.clone(), source })
    }

    /// Every leaf reachable from this node with its full index path, recomputed on each call.
    pub fn traverse_leaf<'n, 'r>(&'n self, row: &'r R) -> LeafIter<'n, 'r, R> {
        LeafIter { row, stack: vec![(self, Vec::new())] }
    }

    /// Leaves of the schema regardless of any row, in declaration order.
    pub fn leaf_nodes(&self) -> Vec<&PropertyNode<R>> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                leaves.push(node);
            }
            stack.extend(node.children.iter().rev());
        }
        leaves
    }

    pub fn find(&self, path: &str) -> Option<&PropertyNode<R>> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.path == path && node.descriptor.is_some() {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }
}

impl<R: Record> PropertyNode<R> {
    pub fn build() -> Self {
        PropertyNode::root(&R::schema().name, R::property_nodes())
    }
}

impl<R> fmt::Debug for PropertyNode<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyNode").field("path", &self.path).field("depth", &self.depth).field("children", &self.children).finish()
    }
}

pub struct LeafIter<'n, 'r, R> {
    row: &'r R,
    stack: Vec<(&'n PropertyNode<R>, Vec<usize>)>,
}

impl<'n, 'r, R: 'static> Iterator for LeafIter<'n, 'r, R> {
    type Item = (&'n PropertyNode<R>, Vec<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, indexes)) = self.stack.pop() {
            match &node.access {
                Access::Leaf { .. } => return Some((node, indexes)),
                Access::Root => self.stack.extend(node.children.iter().rev().map(|child| (child, indexes.clone()))),
                Access::Vertical { count } => {
                    let len = count(self.row, &indexes).unwrap_or(0);
                    for i in (0..len).rev() {
                        for child in node.children.iter().rev() {
                            let mut child_indexes = indexes.clone();
                            child_indexes.push(i);
                            self.stack.push((child, child_indexes));
                        }
                    }
                }
            }
        }
        None
    }
}
