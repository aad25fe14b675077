use std::sync::Arc;

use chrono::{DateTime, Utc};
use flex_convert::{
    ConvertError, Converter, NullBool, NullTime, Nullable, Overrides, Record, ReflectConverter,
    convert_many,
};

#[derive(Record, Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub disabled: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub referer: Option<Box<User>>,
    pub friends: Vec<Option<Box<User>>>,
}

#[derive(Record, Debug, Clone, Default, PartialEq)]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub disabled: NullBool,
    pub is_admin: Option<Box<NullBool>>,
    pub created_at: NullTime,
    pub referer: Option<Box<UserDto>>,
    pub friends: Vec<Option<Box<UserDto>>>,
}

#[derive(Record, Debug, Default, PartialEq)]
pub struct UnMatchUser {
    pub id: i64,
    pub name: i64,
}

fn users() -> ReflectConverter<User, UserDto, i64> {
    ReflectConverter::new(None)
}

fn dto(id: i64, name: &str, age: i32, now: DateTime<Utc>) -> UserDto {
    UserDto {
        id,
        name: name.to_string(),
        age,
        disabled: NullBool::new(false),
        is_admin: Some(Box::new(NullBool::new(true))),
        created_at: NullTime::new(now),
        ..Default::default()
    }
}

fn user(id: i64, name: &str, age: i32, now: DateTime<Utc>) -> User {
    User {
        id,
        name: name.to_string(),
        age,
        is_admin: true,
        created_at: now,
        ..Default::default()
    }
}

#[test]
fn dto_converts_to_entity_recursively() {
    let now = Utc::now();
    let source = UserDto {
        referer: Some(Box::new(dto(2, "referer", 43, now))),
        friends: vec![Some(Box::new(dto(3, "friend1", 32, now)))],
        ..dto(1, "name", 10, now)
    };

    let entity = users().to_entity(&source).unwrap();

    assert_eq!(
        entity,
        User {
            referer: Some(Box::new(user(2, "referer", 43, now))),
            friends: vec![Some(Box::new(user(3, "friend1", 32, now)))],
            ..user(1, "name", 10, now)
        }
    );
}

#[test]
fn pointer_roots_are_mirrored() {
    let conv = ReflectConverter::<Option<User>, Option<UserDto>, i64>::default();
    let source = UserDto {
        id: 1,
        name: "name".into(),
        disabled: NullBool::new(false),
        ..Default::default()
    };

    let entity = conv.to_entity(&Some(source)).unwrap();
    assert_eq!(
        entity,
        Some(User {
            id: 1,
            name: "name".into(),
            ..Default::default()
        })
    );
}

#[test]
fn nil_root_converts_to_nil() {
    let conv = ReflectConverter::<Option<User>, Option<UserDto>, i64>::default();
    assert_eq!(conv.to_entity(&None).unwrap(), None);
    assert_eq!(conv.to_dto(&None).unwrap(), None);
}

#[test]
fn empty_dto_converts_to_empty_entity() {
    assert_eq!(users().to_entity(&UserDto::default()).unwrap(), User::default());
}

#[test]
fn invalid_wrappers_ignore_stored_payload() {
    let source = UserDto {
        disabled: Nullable { value: true, valid: false },
        is_admin: Some(Box::new(Nullable { value: true, valid: false })),
        ..Default::default()
    };

    let entity = users().to_entity(&source).unwrap();
    assert!(!entity.disabled);
    assert!(!entity.is_admin);
}

#[test]
fn entity_converts_to_dto_with_valid_wrappers() {
    let now = Utc::now();
    let entity = User {
        id: 1,
        name: "name".into(),
        age: 10,
        disabled: true,
        is_admin: true,
        created_at: now,
        ..Default::default()
    };

    let out = users().to_dto(&entity).unwrap();

    assert_eq!(
        out,
        UserDto {
            id: 1,
            name: "name".into(),
            age: 10,
            disabled: NullBool::new(true),
            is_admin: Some(Box::new(NullBool::new(true))),
            created_at: NullTime::new(now),
            referer: None,
            friends: Vec::new(),
        }
    );
}

#[test]
fn entity_round_trips_through_dto() {
    let now = Utc::now();
    let entity = User {
        referer: Some(Box::new(User {
            disabled: true,
            ..user(2, "referer", 43, now)
        })),
        friends: vec![None, Some(Box::new(user(3, "friend", 30, now))), None],
        ..user(1, "name", 10, now)
    };

    let conv = users();
    let back = conv.to_entity(&conv.to_dto(&entity).unwrap()).unwrap();
    assert_eq!(back, entity);
}

#[test]
fn slice_of_pointers_keeps_nil_elements() {
    let now = Utc::now();
    let source = UserDto {
        friends: vec![None, Some(Box::new(dto(7, "f", 1, now)))],
        ..Default::default()
    };

    let entity = users().to_entity(&source).unwrap();
    assert_eq!(entity.friends, vec![None, Some(Box::new(user(7, "f", 1, now)))]);
}

#[test]
fn mismatched_field_aborts_conversion() {
    let conv = ReflectConverter::<UnMatchUser, UserDto, i64>::new(None);
    let source = UserDto {
        id: 1,
        name: "John".into(),
        age: 3,
        is_admin: Some(Box::new(NullBool::default())),
        ..Default::default()
    };

    let err = conv.to_entity(&source).unwrap_err();
    assert_eq!(err.to_string(), "cannot assign src.name(String) to dst.name(i64)");
    assert_eq!(
        err,
        ConvertError::FieldTypeMismatch {
            field: "name".into(),
            src_type: "String".into(),
            dst_type: "i64".into(),
        }
    );
}

#[test]
fn empty_slice_of_incompatible_elements_still_mismatches() {
    #[derive(Record, Debug, Default, PartialEq)]
    struct Tagged {
        tags: Vec<i32>,
        id: i64,
    }

    #[derive(Record, Debug, Default, PartialEq)]
    struct Labels {
        tags: Vec<String>,
        id: i64,
    }

    let conv = ReflectConverter::<Labels, Tagged, i64>::default();
    let expected = "cannot assign src.tags(Vec<i32>) to dst.tags(Vec<String>)";

    let empty = conv.to_entity(&Tagged { tags: vec![], id: 1 }).unwrap_err();
    assert_eq!(empty.to_string(), expected);

    let full = conv.to_entity(&Tagged { tags: vec![1], id: 1 }).unwrap_err();
    assert_eq!(full, empty);
}

#[test]
fn empty_slice_of_nested_records_reports_the_nested_field() {
    #[derive(Record, Debug, Default, PartialEq)]
    struct Friend {
        age: String,
    }

    #[derive(Record, Debug, Default, PartialEq)]
    struct Profile {
        friends: Vec<Option<Box<Friend>>>,
    }

    let conv = ReflectConverter::<Profile, UserDto, i64>::default();
    let err = conv.to_entity(&UserDto::default()).unwrap_err();
    assert_eq!(err.to_string(), "cannot assign src.age(i32) to dst.age(String)");
}

#[test]
fn mismatch_in_nested_record_names_the_nested_field() {
    #[derive(Record, Debug, Default, PartialEq)]
    struct Friend {
        age: String,
    }

    #[derive(Record, Debug, Default, PartialEq)]
    struct Profile {
        friends: Vec<Option<Box<Friend>>>,
    }

    let conv = ReflectConverter::<Profile, UserDto, i64>::default();
    let source = UserDto {
        friends: vec![Some(Box::new(UserDto::default()))],
        ..Default::default()
    };

    let err = conv.to_entity(&source).unwrap_err();
    assert_eq!(err.to_string(), "cannot assign src.age(i32) to dst.age(String)");
}

#[test]
fn override_replaces_name_matching() {
    let overrides = Overrides::<UnMatchUser, UserDto>::new()
        .entity_field("name", |dto: &UserDto| dto.name.len() as i64)
        .dto_field("name", |user: &UnMatchUser| format!("user-{}", user.name))
        .dto_field("disabled", |user: &UnMatchUser| user.id == 0);
    let conv = ReflectConverter::<UnMatchUser, UserDto, i64>::new(Some(overrides));

    let entity = conv
        .to_entity(&UserDto {
            id: 4,
            name: "John".into(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(entity, UnMatchUser { id: 4, name: 4 });

    let out = conv.to_dto(&UnMatchUser { id: 0, name: 9 }).unwrap();
    assert_eq!(out.name, "user-9");
    assert_eq!(out.disabled, NullBool::new(true));
    assert_eq!(out.is_admin, None);
}

#[test]
fn override_for_unknown_field_leaves_result_unchanged() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("flex_convert=debug"))
        .with_test_writer()
        .try_init();

    let overrides = Overrides::<User, UserDto>::new().entity_field("nmae", |_: &UserDto| 1i64);
    let conv = ReflectConverter::<User, UserDto, i64>::new(Some(overrides));

    let source = UserDto {
        id: 3,
        name: "name".into(),
        ..Default::default()
    };
    let entity = conv.to_entity(&source).unwrap();
    let plain = users().to_entity(&source).unwrap();
    assert_eq!(entity, plain);
}

#[test]
fn override_with_incompatible_type_is_a_mismatch() {
    let overrides = Overrides::<User, UserDto>::new().entity_field("age", |_: &UserDto| 1.5f64);
    let conv = ReflectConverter::<User, UserDto, i64>::new(Some(overrides));

    let err = conv.to_entity(&UserDto::default()).unwrap_err();
    assert_eq!(err.to_string(), "cannot assign src.age(f64) to dst.age(i32)");
}

#[test]
fn convert_many_preserves_order() {
    let conv = users();
    let dtos = vec![
        UserDto {
            id: 1,
            name: "name1".into(),
            ..Default::default()
        },
        UserDto {
            id: 2,
            name: "name2".into(),
            ..Default::default()
        },
    ];

    let entities = convert_many(&dtos, |dto| conv.to_entity(dto)).unwrap();

    assert_eq!(
        entities,
        vec![
            User {
                id: 1,
                name: "name1".into(),
                ..Default::default()
            },
            User {
                id: 2,
                name: "name2".into(),
                ..Default::default()
            },
        ]
    );
}

#[test]
fn convert_many_of_empty_input_is_unallocated() {
    let conv = users();
    let entities = convert_many(&Vec::<UserDto>::new(), |dto| conv.to_entity(dto)).unwrap();
    assert!(entities.is_empty());
    assert_eq!(entities.capacity(), 0);
}

fn to_entities<C: Converter<User, UserDto, i64>>(conv: &C, dtos: &[UserDto]) -> Vec<User> {
    convert_many(dtos, |dto| conv.to_entity(dto)).unwrap()
}

#[test]
fn usable_through_the_converter_trait() {
    let out = to_entities(&users(), &[UserDto::default()]);
    assert_eq!(out, vec![User::default()]);
}

#[test]
fn shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReflectConverter<User, UserDto, i64>>();

    let now = Utc::now();
    let conv = Arc::new(users());
    std::thread::scope(|scope| {
        for id in 0..8 {
            let conv = Arc::clone(&conv);
            scope.spawn(move || {
                let source = dto(id, "t", 1, now);
                let entity = conv.to_entity(&source).unwrap();
                assert_eq!(entity, user(id, "t", 1, now));
            });
        }
    });
}

#[test]
fn logs_do_not_change_results() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("flex_convert=trace"))
        .with_test_writer()
        .try_init();

    let conv = ReflectConverter::<UnMatchUser, UserDto, i64>::default();
    assert!(conv.to_entity(&UserDto::default()).unwrap_err().is_mismatch());
    assert_eq!(users().to_entity(&UserDto::default()).unwrap(), User::default());
}
