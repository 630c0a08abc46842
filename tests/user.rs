use kat::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(KatRep, Default, Debug, PartialEq, Clone)]
struct User {
    id:   i32,
    name: Option<String>,
    #[kat(alias = "disabled")]
    blocked: bool,
}

#[derive(KatRep, Default, Debug, PartialEq)]
#[kat(name = "Acct", sealed)]
struct Account {
    #[kat(rename = "no", alias = "number", alias = "num")]
    number: i64,
    owner:  User,
    tags:   Vec<String>,
    limits: HashMap<String, f64>,
    #[kat(skip)]
    cache: Option<String>,
}

#[derive(KatRep, Default, Debug, PartialEq)]
#[kat(name = "My User")]
struct Spaced {
    id: i32,
}

#[derive(KatRep, Default, Debug, PartialEq)]
struct Tagged {
    labels: BTreeSet<String>,
    seen:   HashSet<i32>,
}

#[test]
fn binds_through_aliases() {
    let user: User = kat::read("User{i:id(1)s:name(kraity)b:disabled(1)}").unwrap();
    assert_eq!(
        user,
        User {
            id:      1,
            name:    Some("kraity".to_string()),
            blocked: true,
        }
    );
}

#[test]
fn writes_primary_names() {
    let user: User = kat::read("User{i:id(1)s:name(kraity)b:disabled(1)}").unwrap();
    assert_eq!(
        kat::write(&user).unwrap(),
        "User{i:id(1)s:name(kraity)b:blocked(1)}"
    );
}

#[test]
fn aliases_are_equivalent() {
    let a: User = kat::read("User{b:blocked(1)}").unwrap();
    let b: User = kat::read("User{b:disabled(1)}").unwrap();
    assert_eq!(a, b);
}

#[test]
fn absent_fields_keep_defaults() {
    let user: User = kat::read("User{i:id(1)}").unwrap();
    assert_eq!(user.name, None);
    assert!(!user.blocked);
    // null fields are omitted
    assert_eq!(kat::write(&user).unwrap(), "User{i:id(1)b:blocked(0)}");
}

#[test]
fn entity_name_is_not_checked() {
    let user: User = kat::read("Person{i:id(7)}").unwrap();
    assert_eq!(user.id, 7);
}

#[test]
fn unsealed_skips_unknown_fields() {
    let user: User = kat::read("User{i:id(1)s:email(k@x)M:extra{i:a(1)}}").unwrap();
    assert_eq!(user.id, 1);
}

#[test]
fn sealed_rejects_unknown_fields() {
    let err = kat::read::<Account, _>("Acct{l:no(1)s:email(k@x)}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownField);
    assert_eq!(err.to_string(), "`Acct` is sealed and has no field `email`");
}

#[test]
fn sealed_rejects_skipped_fields() {
    let err = kat::read::<Account, _>("Acct{s:cache(x)}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownField);
}

#[test]
fn coercion_errors() {
    let err = kat::read::<User, _>("User{i:id(abc)}").unwrap_err();
    match err {
        Error::Coercion {
            field,
            tag,
            literal,
        } => {
            assert_eq!(field, "id");
            assert_eq!(tag, "i");
            assert_eq!(literal, "abc");
        }
        other => panic!("expected a coercion error, got {:?}", other),
    }

    let on: User = kat::read("User{b:blocked(1)}").unwrap();
    let off: User = kat::read("User{b:blocked(0)}").unwrap();
    assert!(on.blocked);
    assert!(!off.blocked);
}

#[test]
fn nested_coercion_errors_carry_their_path() {
    let err = kat::read::<Account, _>("Acct{User:owner{i:id(x)}}").unwrap_err();
    match err {
        Error::Coercion { field, .. } => assert_eq!(field, "owner.id"),
        other => panic!("expected a coercion error, got {:?}", other),
    }
}

#[test]
fn nested_entities_round_trip() {
    let mut limits = HashMap::new();
    limits.insert("daily".to_string(), 25.5);
    let account = Account {
        number: 42,
        owner: User {
            id:      1,
            name:    Some("kraity".to_string()),
            blocked: false,
        },
        tags: vec!["a)b".to_string(), "c".to_string()],
        limits,
        cache: Some("dropped".to_string()),
    };

    let text = kat::write(&account).unwrap();
    assert_eq!(
        text,
        "Acct{l:no(42)User:owner{i:id(1)s:name(kraity)b:blocked(0)}\
         A:tags{s(a^)b)s(c)}M:limits{d:daily(25.5)}}"
    );

    let back: Account = kat::read(&text).unwrap();
    assert_eq!(
        back,
        Account {
            cache: None,
            ..account
        }
    );
}

#[test]
fn alias_lists_are_all_accepted() {
    for text in &["Acct{l:no(5)}", "Acct{l:number(5)}", "Acct{l:num(5)}"] {
        let account: Account = kat::read(text).unwrap();
        assert_eq!(account.number, 5);
    }
}

#[test]
fn arrays_of_scalars() {
    assert_eq!(kat::write(&vec![1, 2, 3]).unwrap(), "A{i(1)i(2)i(3)}");

    let mixed = Kat::from(vec![Kat::from(1), Kat::from("kraity")]);
    assert_eq!(kat::write(&mixed).unwrap(), "A{i(1)s(kraity)}");

    let widths = Kat::Array(vec![
        Kat::Int(1),
        Kat::Int(2),
        Kat::Long(3),
        Kat::Float(4.0),
        Kat::Double(5.0),
        Kat::Double(6.5),
    ]);
    assert_eq!(
        kat::write(&widths).unwrap(),
        "A{i(1)i(2)l(3)f(4.0)d(5.0)d(6.5)}"
    );
}

#[test]
fn arrays_of_entities() {
    let users: Vec<User> = kat::read("A{User{i:id(1)}User{i:id(2)b:disabled(1)}}").unwrap();
    assert_eq!(users.len(), 2);
    assert!(users[1].blocked);

    let err = kat::read::<Vec<User>, _>("A{User{i:id(1)}User{i:id(x)}}").unwrap_err();
    match err {
        Error::Coercion { field, .. } => assert_eq!(field, "[1].id"),
        other => panic!("expected a coercion error, got {:?}", other),
    }
}

#[test]
fn maps_from_dynamic_data() {
    let data: Kat = vec![("id", Kat::from(1)), ("name", Kat::from("kraity"))]
        .into_iter()
        .collect();
    assert_eq!(kat::write(&data).unwrap(), "M{i:id(1)s:name(kraity)}");
}

#[test]
fn cast_from_a_mapping() {
    let data: Kat = vec![("id", Kat::from(1)), ("name", Kat::from("kraity"))]
        .into_iter()
        .collect();
    let user: User = kat::cast(data).unwrap().unwrap();
    assert_eq!(
        kat::write(&user).unwrap(),
        "User{i:id(1)s:name(kraity)b:blocked(0)}"
    );

    assert_eq!(kat::cast::<User, _>(Kat::Null).unwrap(), None);

    let loose: Kat = vec![("id", Kat::from("9")), ("disabled", Kat::from(1))]
        .into_iter()
        .collect();
    let user: User = kat::cast(loose).unwrap().unwrap();
    assert_eq!(user.id, 9);
    assert!(user.blocked);
}

#[test]
fn entities_to_dynamic_values() {
    let user = User {
        id:      3,
        name:    None,
        blocked: true,
    };
    let mut pairs = Vec::new();
    Supplier::ins()
        .flat(&user, |name, value| pairs.push((name.to_string(), value)))
        .unwrap();
    assert_eq!(
        pairs,
        vec![
            ("id".to_string(), Kat::Int(3)),
            ("blocked".to_string(), Kat::Bool(true)),
        ]
    );

    let value = user.to_kat(Registry::global()).unwrap();
    assert_eq!(value.get("id"), Some(&Kat::Int(3)));
    assert_eq!(value.to_string(), "User{i:id(3)b:blocked(1)}");
}

#[test]
fn dynamic_entities_bind_to_types() {
    let value: Kat = kat::read("User{i:id(4)s:name(k)}").unwrap();
    let user: User = kat::cast(value).unwrap().unwrap();
    assert_eq!(user.id, 4);
    assert_eq!(user.name.as_deref(), Some("k"));
}

#[test]
fn structural_errors() {
    assert_eq!(
        kat::read::<User, _>("User{i:id(1)").unwrap_err().kind(),
        ErrorKind::Syntax
    );
    assert_eq!(
        kat::read::<User, _>("User{i:id(1)}}").unwrap_err().kind(),
        ErrorKind::Syntax
    );
    assert_eq!(
        kat::read::<User, _>("User{s:name(kraity}").unwrap_err().kind(),
        ErrorKind::Lex
    );
    assert_eq!(
        kat::read::<User, _>("User{i:id(1))").unwrap_err().kind(),
        ErrorKind::Lex
    );
    assert_eq!(
        kat::read::<User, _>("i(1)").unwrap_err().kind(),
        ErrorKind::Coercion
    );
}

#[test]
fn entity_names_are_escaped() {
    let spaced = Spaced { id: 1 };
    let text = kat::write(&spaced).unwrap();
    assert_eq!(text, "My^ User{i:id(1)}");
    assert_eq!(kat::read::<Spaced, _>(&text).unwrap(), spaced);

    let value: Kat = kat::read(&text).unwrap();
    match &value {
        Kat::Entity { name, .. } => assert_eq!(name, "My User"),
        other => panic!("expected an entity, got {:?}", other),
    }
    assert_eq!(kat::write(&value).unwrap(), text);
}

#[test]
fn dynamic_values_that_would_read_back_differently() {
    let fields: VecMap<String, Kat> = vec![("x".to_string(), Kat::from(1))].into_iter().collect();
    for name in &["", "A", "M"] {
        let entity = Kat::Entity {
            name:   name.to_string(),
            fields: fields.clone(),
        };
        assert_eq!(kat::write(&entity).unwrap_err().kind(), ErrorKind::Coercion);
    }

    for tag in &["", "i", "s", "b"] {
        let opaque = Kat::Array(vec![Kat::Opaque {
            tag:  tag.to_string(),
            text: "x".to_string(),
        }]);
        assert_eq!(kat::write(&opaque).unwrap_err().kind(), ErrorKind::Coercion);
    }

    let opaque = Kat::Array(vec![Kat::Opaque {
        tag:  "u 8".to_string(),
        text: "x".to_string(),
    }]);
    let text = kat::write(&opaque).unwrap();
    assert_eq!(text, "A{u^ 8(x)}");
    assert_eq!(kat::read::<Kat, _>(&text).unwrap(), opaque);
}

#[test]
fn reads_sets() {
    let text = "A{s(1)s(kat)s(1)}";
    let expected = vec!["1".to_string(), "kat".to_string()];

    let set: HashSet<String> = kat::read(text).unwrap();
    assert_eq!(set, expected.iter().cloned().collect::<HashSet<_>>());
    let set: hashbrown::HashSet<String> = kat::read(text).unwrap();
    assert_eq!(set, expected.iter().cloned().collect::<hashbrown::HashSet<_>>());
    let set: BTreeSet<String> = kat::read(text).unwrap();
    assert_eq!(set.into_iter().collect::<Vec<_>>(), expected);

    let tagged: Tagged = kat::read("Tagged{A:labels{s(b)s(a)}A:seen{i(3)i(3)}}").unwrap();
    assert_eq!(tagged.seen.len(), 1);
    assert_eq!(kat::write(&tagged).unwrap(), "Tagged{A:labels{s(a)s(b)}A:seen{i(3)}}");

    match kat::read::<BTreeSet<i32>, _>("A{i(1)i(x)}").unwrap_err() {
        Error::Coercion { field, .. } => assert_eq!(field, "[1]"),
        other => panic!("expected a coercion error, got {:?}", other),
    }
}

#[test]
fn binds_large_maps() {
    let n = 50_000;
    let mut text = String::from("M{");
    for i in 0..n {
        text.push_str(&format!("i:k{}({})", i, i));
    }
    text.push_str("i:k0(-1)}");

    let value: Kat = kat::read(&text).unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(map.len(), n);
    assert_eq!(map.get("k0"), Some(&Kat::Int(-1)));
    assert_eq!(map.keys().next().map(String::as_str), Some("k0"));

    let typed: VecMap<String, i32> = kat::read(&text).unwrap();
    assert_eq!(typed.get("k49999"), Some(&49_999));
}
