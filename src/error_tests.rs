use super::*;

#[test]
fn http_status_mapping() {
    assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
    assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
    assert_eq!(AppError::auth("auth", "no").http_status(), 401);
    assert_eq!(AppError::forbidden("forbidden", "no").http_status(), 403);
    assert_eq!(AppError::csrf("csrf", "blocked").http_status(), 403);
    assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
}

#[test]
fn store_errors_map_to_not_found_and_internal() {
    let nf: AppError = StoreError::NotFound("contact 7".into()).into();
    assert_eq!(nf.http_status(), 404);
    assert_eq!(nf.message(), "contact 7 not found");

    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let persist: AppError = StoreError::Persist { path: "contacts.json".into(), source: io }.into();
    assert_eq!(persist.http_status(), 500);
    assert_eq!(persist.code_str(), "internal_error");
}

#[test]
fn anyhow_keeps_wrapped_app_error() {
    let err = anyhow::Error::new(AppError::user("invalid_status", "bad status"));
    let app: AppError = err.into();
    assert_eq!(app.http_status(), 400);

    let plain: AppError = anyhow::anyhow!("disk on fire").into();
    assert_eq!(plain.http_status(), 500);
    assert_eq!(plain.to_string(), "internal_error: disk on fire");
}
