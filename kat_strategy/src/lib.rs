use kat::{vecmap::VecMap, Kat, Tag};
use proptest::prelude::*;

/// arbitrary member name for use with proptest, including ones that need escaping
pub fn arb_name() -> impl Strategy<Value = String> { ".{0,8}" }

/// arbitrary entity name for use with proptest, including ones that need escaping
pub fn arb_entity_name() -> impl Strategy<Value = String> {
    ".{1,8}".prop_filter("block tag", |name| name != "A" && name != "M")
}

/// arbitrary unknown scalar tag for use with proptest
pub fn arb_opaque_tag() -> impl Strategy<Value = String> {
    ".{1,4}".prop_filter("known tag", |tag| Tag::scalar(tag).is_opaque())
}

/// arbitrary literal text for use with proptest
pub fn arb_literal() -> impl Strategy<Value = String> { any::<String>() }

/// arbitrary scalar Kat for use with proptest
pub fn arb_scalar() -> impl Strategy<Value = Kat> {
    prop_oneof![
        any::<bool>().prop_map(Kat::Bool),
        any::<i32>().prop_map(Kat::Int),
        any::<i64>().prop_map(Kat::Long),
        // non-finite floats do not compare equal to themselves
        any::<f32>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Kat::Float),
        any::<f64>()
            .prop_filter("finite", |d| d.is_finite())
            .prop_map(Kat::Double),
        arb_literal().prop_map(Kat::Str),
        (arb_opaque_tag(), arb_literal()).prop_map(|(tag, text)| Kat::Opaque { tag, text }),
    ]
}

/// arbitrary Kat for use with proptest
///
/// Never produces [`Kat::Null`], which has no written form.
pub fn arb_kat() -> impl Strategy<Value = Kat> {
    arb_scalar().prop_recursive(
        8,  // max depth
        64, // max nodes
        10, // max items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..10).prop_map(Kat::Array),
                prop::collection::btree_map(arb_name(), inner.clone(), 0..10)
                    .prop_map(|m| Kat::Map(VecMap::from(m))),
                (
                    arb_entity_name(),
                    prop::collection::btree_map(arb_name(), inner, 0..10)
                )
                    .prop_map(|(name, m)| Kat::Entity {
                        name,
                        fields: VecMap::from(m),
                    }),
            ]
        },
    )
}
