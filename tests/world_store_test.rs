mod common;

use assert_matches::assert_matches;
use cobble::error::ErrorKind;
use cobble::nbt::Tag;
use cobble::world::{World, WorldHandle};
use cobble::CobbleError;
use common::*;
use futures::future::join_all;
use std::fs;
use std::sync::Arc;

#[test]
fn test_open_reads_level_and_takes_lock() {
    let world = TestWorld::new("open");
    let mut opened = World::open(&world.dir).unwrap();

    assert_eq!(opened.level(), &level_data());
    assert_eq!(opened.level().spawn, SPAWN);
    assert_ne!(world.read_lock(), 0);
    opened.verify_lock().unwrap();
    opened.verify_lock().unwrap();
    opened.close();
}

#[test]
fn test_open_requires_a_directory() {
    let world = TestWorld::new("not-dir");
    assert_matches!(
        World::open(world.level_path()),
        Err(CobbleError::NotADirectory(_))
    );
    assert_matches!(
        World::open(world.dir.join("nowhere")),
        Err(CobbleError::NotADirectory(_))
    );
}

#[test]
fn test_open_reports_each_missing_file() {
    let world = TestWorld::new("missing-level");
    fs::remove_file(world.level_path()).unwrap();
    assert_matches!(
        World::open(&world.dir),
        Err(CobbleError::MissingLevelData(_))
    );
    // the lock is left alone when validation fails
    assert_eq!(world.read_lock(), 0);

    let world = TestWorld::new("missing-lock");
    fs::remove_file(world.lock_path()).unwrap();
    let err = World::open(&world.dir).unwrap_err();
    assert_matches!(err, CobbleError::MissingSessionLock(_));
    assert_eq!(err.kind(), ErrorKind::WorldIntegrity);
    assert!(!world.lock_path().exists());
}

#[test]
fn test_open_rejects_wrongly_typed_metadata() {
    let world = TestWorld::new("bad-level");
    let mut data = level_data().to_compound();
    data.insert("SpawnY", Tag::Short(70));
    world.write_level(&data);

    let err = World::open(&world.dir).unwrap_err();
    assert_matches!(&err, CobbleError::MalformedLevelData { .. });
    assert_eq!(err.kind(), ErrorKind::WorldIntegrity);
    assert_eq!(err.root_cause().kind(), ErrorKind::Decode);
    assert!(err.to_string().contains("SpawnY"));
}

#[test]
fn test_open_reports_io_failures_on_the_world_path() {
    let world = TestWorld::new("unreadable");
    // the OS refuses the lookup itself; this is not a missing directory
    let err = World::open(world.dir.join("bad\0name")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_matches!(err.root_cause(), CobbleError::IoError(_));
}

#[test]
fn test_lock_lost_to_another_process() {
    let world = TestWorld::new("stolen");
    world.write_chunk(0, 0);
    let mut opened = World::open(&world.dir).unwrap();
    opened.load_chunk(0, 0).unwrap();

    world.steal_lock(world.read_lock() + 1);

    assert_matches!(opened.verify_lock(), Err(CobbleError::LockLost { .. }));
    // even cached chunks are refused
    let err = opened.load_chunk(0, 0).unwrap_err();
    assert_matches!(err.root_cause(), CobbleError::LockLost { .. });
    assert_eq!(err.kind(), ErrorKind::WorldIntegrity);
}

#[test]
fn test_load_chunk_projects_level_compound() {
    let world = TestWorld::new("load");
    let written = world.write_chunk(-1, -65);
    let mut opened = World::open(&world.dir).unwrap();

    let chunk = opened.load_chunk(-1, -65).unwrap();
    assert_eq!(*chunk, written);
    assert_eq!(chunk.tile_entities.len(), 1);
    assert!(chunk.entities.is_empty());
    assert_eq!(opened.loaded_chunks(), 1);
}

#[test]
fn test_load_chunk_is_idempotent() {
    let world = TestWorld::new("idempotent");
    world.write_chunk(3, 4);
    let mut opened = World::open(&world.dir).unwrap();

    let first = opened.load_chunk(3, 4).unwrap();
    // a second decode would fail now
    fs::write(world.chunk_file(3, 4), b"not a chunk").unwrap();
    let second = opened.load_chunk(3, 4).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(opened.loaded_chunks(), 1);
    assert!(opened.chunk(3, 4).is_some());
    assert!(opened.chunk(4, 3).is_none());
}

#[test]
fn test_failed_load_leaves_cache_untouched() {
    let world = TestWorld::new("failed");
    let mut opened = World::open(&world.dir).unwrap();

    let err = opened.load_chunk(7, 7).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(opened.loaded_chunks(), 0);

    let path = world.chunk_file(7, 7);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"garbage").unwrap();
    assert!(opened.load_chunk(7, 7).is_err());
    assert!(opened.chunk(7, 7).is_none());

    let written = world.write_chunk(7, 7);
    assert_eq!(*opened.load_chunk(7, 7).unwrap(), written);
}

#[tokio::test]
async fn test_world_handle_serializes_chunk_loads() {
    let world = TestWorld::new("handle");
    let written = world.write_chunk(2, -2);
    let handle = WorldHandle::spawn(World::open(&world.dir).unwrap());

    let loads = (0..8).map(|_| {
        let handle = handle.clone();
        async move { handle.load_chunk(2, -2).await.unwrap() }
    });
    let chunks = join_all(loads).await;

    assert_eq!(*chunks[0], written);
    for chunk in &chunks[1..] {
        assert!(Arc::ptr_eq(&chunks[0], chunk));
    }
    assert!(handle.load_chunk(9, 9).await.is_err());
    assert_eq!(handle.spawn_position().await.unwrap(), SPAWN);
}

#[tokio::test]
async fn test_world_handle_tracks_players() {
    let world = TestWorld::new("players");
    let handle = WorldHandle::spawn(World::open(&world.dir).unwrap());

    assert_eq!(handle.player(3).await.unwrap(), None);

    let position = cobble::types::PlayerPosition {
        x: 1.0,
        y: 64.0,
        stance: 65.62,
        z: -1.0,
    };
    handle.set_player_position(3, position).await.unwrap();
    let state = handle.player(3).await.unwrap().unwrap();
    assert_eq!(state.position, position);
    assert_eq!(state.look, cobble::types::PlayerLook::default());

    let look = cobble::types::PlayerLook {
        rotation: 180.0,
        pitch: 10.0,
    };
    handle.set_player_look(3, look).await.unwrap();
    assert_eq!(handle.player(3).await.unwrap().unwrap().look, look);

    handle.remove_player(3).await.unwrap();
    assert_eq!(handle.player(3).await.unwrap(), None);
}
