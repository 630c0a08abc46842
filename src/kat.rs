//! The dynamic [`Kat`] value.
//!
//! [`Kat`] is what a Kat document decodes to when no target type is known ahead of
//! time, and what loosely typed data is converted into before it is
//! [cast](crate::Supplier::cast) to a typed value.

use crate::{
    decode::Binder,
    encode::{fmt_f32, fmt_f64, Flow},
    errors::Error,
    parser::Node,
    registry::Registry,
    rep::{parse_bool, parse_float, parse_int, KatRep},
    tag::Tag,
    vecmap::VecMap,
};
use std::{collections::BTreeMap, fmt};

/// A dynamically tagged Kat value.
///
/// # Example
///
/// ```
/// use kat::prelude::*;
///
/// let value: Kat = kat::parse("M{i:id(1)s:name(kraity)}").unwrap();
///
/// assert_eq!(value.get("id"), Some(&Kat::Int(1)));
/// assert_eq!(value.get("name").and_then(Kat::as_str), Some("kraity"));
/// assert_eq!(value.to_string(), "M{i:id(1)s:name(kraity)}");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Kat {
    /// The absence of a value. Never written; members holding it are omitted.
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    /// A scalar with a tag this crate does not know, kept as written.
    Opaque { tag: String, text: String },
    Array(Vec<Kat>),
    Map(VecMap<String, Kat>),
    Entity {
        name:   String,
        fields: VecMap<String, Kat>,
    },
}

use Kat::*;

impl Kat {
    /// Indicates whether this value is [`Kat::Null`].
    pub fn is_null(&self) -> bool {
        match self {
            Null => true,
            _ => false,
        }
    }

    /// Looks up a member of a map or entity.
    pub fn get(&self, key: &str) -> Option<&Kat> {
        match self {
            Map(members) | Entity { fields: members, .. } => members.get(key),
            _ => None,
        }
    }

    /// Returns the value as a [`bool`], if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns an integer value, widened to [`i64`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Int(i) => Some(i64::from(*i)),
            Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Returns a floating point value, widened to [`f64`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Float(f) => Some(f64::from(*f)),
            Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Kat>> {
        match self {
            Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the members of a map or the fields of an entity.
    pub fn as_map(&self) -> Option<&VecMap<String, Kat>> {
        match self {
            Map(members) | Entity { fields: members, .. } => Some(members),
            _ => None,
        }
    }

    /// Converts this value into a parse tree, as if it had been read from text.
    ///
    /// Returns `None` for [`Kat::Null`]; null members and elements are dropped.
    pub fn into_node(self) -> Option<Node> {
        fn scalar(tag: Tag, text: String) -> Option<Node> { Some(Node::Scalar { tag, text }) }

        fn members(members: VecMap<String, Kat>) -> Vec<(String, Node)> {
            members
                .into_iter()
                .filter_map(|(k, v)| Some((k, v.into_node()?)))
                .collect()
        }

        match self {
            Null => None,
            Bool(b) => scalar(Tag::Bool, if b { "1" } else { "0" }.to_string()),
            Int(i) => scalar(Tag::Int, i.to_string()),
            Long(l) => scalar(Tag::Long, l.to_string()),
            Float(f) => scalar(Tag::Float, fmt_f32(f)),
            Double(d) => scalar(Tag::Double, fmt_f64(d)),
            Str(s) => scalar(Tag::Str, s),
            Opaque { tag, text } => scalar(Tag::Opaque(tag), text),
            Array(items) => Some(Node::Array(
                items.into_iter().filter_map(Kat::into_node).collect(),
            )),
            Map(pairs) => Some(Node::Map(members(pairs))),
            Entity { name, fields } => Some(Node::Entity {
                name,
                fields: members(fields),
            }),
        }
    }
}

impl KatRep for Kat {
    const NULLABLE: bool = true;

    fn tag() -> Tag { Tag::Any }

    fn is_null(&self) -> bool { Kat::is_null(self) }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        match self {
            Null => {}
            Bool(b) => flow.put_bool(name, *b),
            Int(i) => flow.put_int(name, *i),
            Long(l) => flow.put_long(name, *l),
            Float(f) => flow.put_f32(name, *f),
            Double(d) => flow.put_f64(name, *d),
            Str(s) => flow.put_str(name, s),
            Opaque { tag, text } => flow.put_opaque(tag, name, text)?,
            Array(items) => items.write(flow, name)?,
            Map(members) => members.write(flow, name)?,
            Entity {
                name: entity,
                fields,
            } => {
                flow.open_entity(entity, name)?;
                for (key, value) in fields.iter().filter(|(_, v)| !v.is_null()) {
                    value.write(flow, Some(key))?;
                }
                flow.close();
            }
        }
        Ok(())
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> {
        let (tag, scalar) = match node {
            Node::Scalar { tag, text } => (
                tag.clone(),
                Node::Scalar { tag, text },
            ),
            Node::Array(_) => return <Vec<Kat>>::bind(node, binder).map(Array),
            Node::Map(_) => return <VecMap<String, Kat>>::bind(node, binder).map(Map),
            Node::Entity { name, fields } => {
                let fields = fields
                    .into_iter()
                    .map(|(key, value)| match binder.bind::<Kat>(value) {
                        Ok(v) => Ok((key, v)),
                        Err(e) => Err(e.in_field(&key)),
                    })
                    .collect::<Result<VecMap<_, _>, Error>>()?;
                return Ok(Entity { name, fields });
            }
        };
        match tag {
            Tag::Int => parse_int(scalar, &tag).map(Int),
            Tag::Long => parse_int(scalar, &tag).map(Long),
            Tag::Float => parse_float(scalar, &tag).map(Float),
            Tag::Double => parse_float(scalar, &tag).map(Double),
            Tag::Bool => parse_bool(scalar).map(Bool),
            Tag::Str => String::bind(scalar, binder).map(Str),
            other => {
                let text = scalar.into_literal(&other)?;
                Ok(Opaque {
                    tag: other.to_string(),
                    text,
                })
            }
        }
    }

    fn to_kat(&self, _: &Registry) -> Result<Kat, Error> { Ok(self.clone()) }
}

impl fmt::Display for Kat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut flow = Flow::new();
        self.write(&mut flow, None).map_err(|_| fmt::Error)?;
        f.write_str(flow.as_str())
    }
}

macro_rules! from_prim {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for Kat {
                fn from(v: $t) -> Kat { $variant(v.into()) }
            }
        )*
    };
}

from_prim!(Bool, bool);
from_prim!(Int, i8, i16, i32, u8, u16);
from_prim!(Long, i64, u32);
from_prim!(Float, f32);
from_prim!(Double, f64);
from_prim!(Str, String, &str, char);

impl<T: Into<Kat>> From<Option<T>> for Kat {
    fn from(v: Option<T>) -> Kat {
        match v {
            Some(t) => t.into(),
            None => Null,
        }
    }
}

impl<T: Into<Kat>> From<Vec<T>> for Kat {
    fn from(v: Vec<T>) -> Kat { Array(v.into_iter().map(Into::into).collect()) }
}

impl<T: Into<Kat>> From<VecMap<String, T>> for Kat {
    fn from(v: VecMap<String, T>) -> Kat {
        Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Kat>> From<BTreeMap<String, T>> for Kat {
    fn from(v: BTreeMap<String, T>) -> Kat {
        Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<K: Into<String>, T: Into<Kat>> std::iter::FromIterator<(K, T)> for Kat {
    /// Collects pairs into a [`Kat::Map`], keeping their order.
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Kat {
        Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn bind(text: &str) -> Kat { Binder::default().bind(parse(text).unwrap()).unwrap() }

    #[test]
    fn mixed_arrays() {
        let text = "A{i(1)i(2)l(3)f(4.0)d(5.0)d(6.5)}";
        let value = bind(text);
        assert_eq!(
            value,
            Array(vec![
                Int(1),
                Int(2),
                Long(3),
                Float(4.0),
                Double(5.0),
                Double(6.5)
            ])
        );
        assert_eq!(value.to_string(), text);
    }

    #[test]
    fn maps_keep_order() {
        let value: Kat = vec![("id", Kat::from(1)), ("name", Kat::from("kraity"))]
            .into_iter()
            .collect();
        assert_eq!(value.to_string(), "M{i:id(1)s:name(kraity)}");
    }

    #[test]
    fn nulls_are_omitted() {
        let value: Kat = vec![("id", Kat::from(1)), ("gone", Null)].into_iter().collect();
        assert_eq!(value.to_string(), "M{i:id(1)}");
        assert_eq!(Kat::from(vec![Null, Int(2)]).to_string(), "A{i(2)}");
        assert_eq!(Kat::from(None::<i32>), Null);
    }

    #[test]
    fn entities_and_opaque_scalars() {
        let value = bind("User{i:id(1)zz:x(raw)}");
        match &value {
            Entity { name, fields } => {
                assert_eq!(name, "User");
                assert_eq!(
                    fields.get("x"),
                    Some(&Opaque {
                        tag:  "zz".to_string(),
                        text: "raw".to_string(),
                    })
                );
            }
            other => panic!("expected an entity, got {:?}", other),
        }
        assert_eq!(value.to_string(), "User{i:id(1)zz:x(raw)}");
    }

    #[test]
    fn scalar_coercion_is_checked() {
        let err = Binder::default()
            .bind::<Kat>(parse("M{i:id(x)}").unwrap())
            .unwrap_err();
        match err {
            Error::Coercion { field, tag, literal } => {
                assert_eq!(field, "id");
                assert_eq!(tag, "i");
                assert_eq!(literal, "x");
            }
            other => panic!("expected a coercion error, got {:?}", other),
        }
    }

    #[test]
    fn into_node_drops_nulls() {
        let value: Kat = vec![("a", Null), ("b", Kat::from(true))].into_iter().collect();
        assert_eq!(
            value.into_node(),
            Some(Node::Map(vec![(
                "b".to_string(),
                Node::Scalar {
                    tag:  Tag::Bool,
                    text: "1".to_string(),
                }
            )]))
        );
        assert_eq!(Null.into_node(), None);
    }
}
