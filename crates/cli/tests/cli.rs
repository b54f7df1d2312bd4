use assert_cmd::Command;
use serde_json::Value;

#[test]
fn openapi_prints_book_paths() {
    let output = Command::cargo_bin("bookshelf-cli")
        .unwrap()
        .arg("openapi")
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(doc["paths"]["/books"]["post"].is_object());
    assert!(doc["paths"]["/books/{bookId}"]["delete"].is_object());
    assert!(doc["components"]["schemas"]["Book"].is_object());
}

#[test]
fn routes_lists_the_books_module() {
    Command::cargo_bin("bookshelf-cli")
        .unwrap()
        .arg("routes")
        .assert()
        .success()
        .stdout("books\t/books\n");
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("bookshelf-cli")
        .unwrap()
        .arg("shelve")
        .assert()
        .failure();
}
