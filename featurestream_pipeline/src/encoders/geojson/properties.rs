use anyhow::{Result, anyhow, bail};
use featurestream_core::json::{JsonScalar, JsonWrite};

#[derive(Clone, Debug, PartialEq)]
enum Node {
	Value(JsonScalar),
	Object(Vec<(String, Node)>),
	Array(Vec<Node>),
}

impl Node {
	fn empty(leaf: bool) -> Self {
		if leaf { Node::Value(JsonScalar::Null) } else { Node::Object(Vec::new()) }
	}

	fn write_json(&self, writer: &mut dyn JsonWrite) -> Result<()> {
		match self {
			Node::Value(value) => writer.scalar(value),
			Node::Object(fields) => write_fields(fields, writer),
			Node::Array(items) => {
				writer.start_array()?;
				for item in items {
					item.write_json(writer)?;
				}
				writer.end_array()
			}
		}
	}
}

fn write_fields(fields: &[(String, Node)], writer: &mut dyn JsonWrite) -> Result<()> {
	writer.start_object()?;
	for (name, node) in fields {
		writer.field(name)?;
		node.write_json(writer)?;
	}
	writer.end_object()
}

/// The properties of one feature, assembled from flat property events.
///
/// Fields keep the order in which they first appeared.
#[derive(Debug, Default)]
pub struct PropertyTree {
	root: Vec<(String, Node)>,
}

impl PropertyTree {
	pub fn clear(&mut self) {
		self.root.clear();
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.root.is_empty()
	}

	/// Sets the value at `path`. `arrays` flags the array segments; each of them takes the
	/// next index from `multiplicity`.
	pub fn insert(&mut self, path: &[String], arrays: &[bool], multiplicity: &[usize], value: JsonScalar) -> Result<()> {
		insert_field(&mut self.root, path, arrays, &mut multiplicity.iter(), value)
	}

	pub fn write_json(&self, writer: &mut dyn JsonWrite) -> Result<()> {
		write_fields(&self.root, writer)
	}
}

fn insert_field(
	fields: &mut Vec<(String, Node)>,
	path: &[String],
	arrays: &[bool],
	indices: &mut std::slice::Iter<usize>,
	value: JsonScalar,
) -> Result<()> {
	let (name, rest) = path.split_first().ok_or_else(|| anyhow!("empty property path"))?;
	let is_array = arrays.first().copied().unwrap_or(false);
	let is_leaf = rest.is_empty();

	let position = match fields.iter().position(|(n, _)| n == name) {
		Some(position) => position,
		None => {
			let node = if is_array { Node::Array(Vec::new()) } else { Node::empty(is_leaf) };
			fields.push((name.clone(), node));
			fields.len() - 1
		}
	};

	let mut node = &mut fields[position].1;
	if is_array {
		let index = indices.next().copied().unwrap_or(0);
		let Node::Array(items) = node else {
			bail!("property '{name}' is used both as array and as single value");
		};
		while items.len() <= index {
			items.push(Node::empty(is_leaf));
		}
		node = &mut items[index];
	}

	if is_leaf {
		*node = Node::Value(value);
		return Ok(());
	}

	let Node::Object(children) = node else {
		bail!("property '{name}' is used both as object and as value");
	};
	insert_field(children, rest, arrays.get(1..).unwrap_or_default(), indices, value)
}
