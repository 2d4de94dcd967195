use std::fs;
use std::time::Duration;

use tokio::time::timeout;

use chute::testutil::drop_dir;
use chute::watch::DirWatcher;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_created_csv_is_delivered() {
    let dir = drop_dir();
    let mut watcher = DirWatcher::start(dir.path(), true).unwrap();

    let path = dir.path().join("orders.csv");
    fs::write(&path, "id,name\n1,widget\n").unwrap();

    let delivered = timeout(WAIT, watcher.next()).await.unwrap().unwrap();
    assert_eq!(delivered, path);
}

#[tokio::test]
async fn test_non_csv_files_are_ignored() {
    let dir = drop_dir();
    let mut watcher = DirWatcher::start(dir.path(), true).unwrap();

    fs::write(dir.path().join("notes.txt"), "not a csv").unwrap();
    fs::create_dir(dir.path().join("archive.csv")).unwrap();
    let csv = dir.path().join("sales.csv");
    fs::write(&csv, "day,total\nmon,5\n").unwrap();

    // The first delivery skips straight past the .txt file and the
    // directory with a .csv suffix.
    let delivered = timeout(WAIT, watcher.next()).await.unwrap().unwrap();
    assert_eq!(delivered, csv);
}

#[tokio::test]
async fn test_recursive_watch_sees_subdirectories() {
    let dir = drop_dir();
    let sub = dir.path().join("incoming");
    fs::create_dir(&sub).unwrap();
    let mut watcher = DirWatcher::start(dir.path(), true).unwrap();

    let path = sub.join("orders.csv");
    fs::write(&path, "id,name\n1,widget\n").unwrap();

    let delivered = timeout(WAIT, watcher.next()).await.unwrap().unwrap();
    assert_eq!(delivered, path);
}

#[tokio::test]
async fn test_deliveries_keep_creation_order() {
    let dir = drop_dir();
    let mut watcher = DirWatcher::start(dir.path(), true).unwrap();

    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    fs::write(&a, "x\n1\n").unwrap();
    fs::write(&b, "y\n2\n").unwrap();

    assert_eq!(timeout(WAIT, watcher.next()).await.unwrap().unwrap(), a);
    assert_eq!(timeout(WAIT, watcher.next()).await.unwrap().unwrap(), b);
}
