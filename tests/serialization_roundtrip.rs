use std::path::Path;

use rating_backend::rating::Vote;
use rating_backend::store::files::DataPaths;
use rating_backend::store::operations::comments::Comment;
use rating_backend::store::operations::metas::ProblemMeta;
use rating_backend::store::operations::users::User;
use rating_backend::store::Store;

fn open(dir: &Path, sled_name: &str) -> Store {
    let sled_path = dir.join(sled_name);
    Store::open(
        DataPaths::new(dir.join("data")),
        sled_path.to_str().expect("utf-8 path"),
        "admin",
    )
    .expect("open store")
}

fn vote(voter: &str, thinking: f64, implementing: f64, quality: f64) -> Vote {
    Vote {
        voter: voter.to_string(),
        thinking,
        implementing,
        quality,
    }
}

#[test]
fn ratings_survive_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path(), "a.sled");

    store.upsert_vote("题目A", vote("alice", 1523.5, 1611.25, -1.5));
    store.upsert_vote("题目A", vote("bob", 2000.0, 2100.0, 4.0));
    store.upsert_vote("题目B", vote("alice", 800.0, 3500.0, 0.1));
    store.add_comment(
        "题目A",
        Comment {
            user: "bob".into(),
            text: "线段树\n\"模板\"".into(),
            time: 1_700_000_000.123_456,
        },
    );
    store.set_meta(
        "题目B",
        ProblemMeta {
            difficulty: "普及+/提高".into(),
            tags: "dp, 贪心".into(),
        },
    );
    assert!(store.is_dirty());
    store.save_ratings().unwrap();
    assert!(!store.is_dirty());

    let reloaded = open(dir.path(), "b.sled");
    assert_eq!(reloaded.ratings_snapshot(), store.ratings_snapshot());
}

#[test]
fn users_survive_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path(), "a.sled");

    let user = User {
        tag_permissions: vec!["CF".into()],
        ..User::new("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into())
    };
    store.create_user("alice", user.clone()).unwrap();

    let reloaded = open(dir.path(), "b.sled");
    assert_eq!(reloaded.get_user("alice").unwrap().tag_permissions, user.tag_permissions);
}

#[test]
fn legacy_file_is_upgraded_once() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("votes.json"),
        r#"{
            "P1": [{"voter": "alice", "thinking": 1500, "implementing": 1700, "quality": 3500}],
            "P2": [{"voter": "bob", "thinking": 1200, "implementing": 1300, "quality": 2.5}]
        }"#,
    )
    .unwrap();

    let first = open(dir.path(), "a.sled");
    let p1 = first.get_votes("P1");
    assert_eq!(p1[0].quality, (3500.0 / 2.0 * 270.0 + 2150.0 - 800.0) / 2700.0 * 10.0 - 5.0);
    assert_eq!(first.get_votes("P2")[0].quality, 2.5);

    let text = std::fs::read_to_string(data.join("votes.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(json.get("votes").is_some());
    assert!(json.get("comments").is_some());

    let second = open(dir.path(), "b.sled");
    assert_eq!(second.ratings_snapshot(), first.ratings_snapshot());
}

#[test]
fn corrupt_ratings_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("votes.json"), "{ not json").unwrap();

    let sled_path = dir.path().join("a.sled");
    let result = Store::open(
        DataPaths::new(&data),
        sled_path.to_str().unwrap(),
        "admin",
    );
    assert!(result.is_err());
}
