//! Startup seeding against on-disk stores, and the approval workflow across a
//! restart.

use anyhow::Result;
use tempfile::tempdir;

use contactmgr::contacts::{ContactStatus, ContactStore, FileContactStore};
use contactmgr::identity::{decide, AuthProvider, LocalAuthProvider, LoginRequest, Operation, RoleNames, SessionManager};
use contactmgr::security::UserStore;
use contactmgr::seed::{initialize, SeedConfig, DEFAULT_ADMIN_USER, DEFAULT_MANAGER_USER};

const PW: &str = "Seed-Passw0rd";

fn seed_cfg() -> SeedConfig {
    SeedConfig { user_password: Some(PW.into()), ..Default::default() }
}

#[test]
fn seeding_is_idempotent_across_restarts() -> Result<()> {
    let tmp = tempdir()?;
    let first = {
        let users = UserStore::open(tmp.path())?;
        let contacts = FileContactStore::open(tmp.path())?;
        initialize(&users, &contacts, &seed_cfg())?
    };
    assert_eq!(first.contacts_created, 3);

    let users = UserStore::open(tmp.path())?;
    let contacts = FileContactStore::open(tmp.path())?;
    let second = initialize(&users, &contacts, &seed_cfg())?;
    assert_eq!(second.contacts_created, 0);
    assert_eq!(second.admin_id, first.admin_id);
    assert_eq!(second.manager_id, first.manager_id);
    assert_eq!(contacts.list().len(), 3);
    assert_eq!(users.len(), 2);
    Ok(())
}

#[test]
fn manager_login_approves_and_status_survives_restart() -> Result<()> {
    let tmp = tempdir()?;
    let users = UserStore::open(tmp.path())?;
    let contacts = FileContactStore::open(tmp.path())?;
    initialize(&users, &contacts, &seed_cfg())?;

    let provider = LocalAuthProvider::new(users.clone(), RoleNames::default(), SessionManager::default());
    let manager = provider
        .login(&LoginRequest { username: DEFAULT_MANAGER_USER.into(), password: PW.into(), ip: None })?
        .session
        .principal;
    let admin = provider
        .login(&LoginRequest { username: DEFAULT_ADMIN_USER.into(), password: PW.into(), ip: None })?
        .session
        .principal;

    let submitted = contacts
        .list()
        .into_iter()
        .find(|c| c.status == ContactStatus::Submitted)
        .expect("seeded submitted contact");

    assert!(!decide(Some(&admin), &Operation::Approve, Some(&submitted)).succeeded());
    assert!(decide(Some(&manager), &Operation::Approve, Some(&submitted)).succeeded());
    contacts.update_status(submitted.contact_id, ContactStatus::Approved)?;
    drop(contacts);

    let reopened = FileContactStore::open(tmp.path())?;
    assert_eq!(reopened.get(submitted.contact_id).map(|c| c.status), Some(ContactStatus::Approved));
    Ok(())
}

#[test]
fn renamed_manager_role_is_honoured_at_login() -> Result<()> {
    let tmp = tempdir()?;
    let names = RoleNames { administrators: "Admins".into(), managers: "Approvers".into() };
    let users = UserStore::open(tmp.path())?;
    let contacts = FileContactStore::open(tmp.path())?;
    initialize(&users, &contacts, &SeedConfig { role_names: names.clone(), ..seed_cfg() })?;

    // A provider configured with the default names does not recognise the renamed role
    let default_names = LocalAuthProvider::new(users.clone(), RoleNames::default(), SessionManager::default());
    let req = LoginRequest { username: DEFAULT_MANAGER_USER.into(), password: PW.into(), ip: None };
    let p = default_names.login(&req)?.session.principal;
    assert!(p.roles.is_empty());

    let configured = LocalAuthProvider::new(users, names, SessionManager::default());
    let p = configured.login(&req)?.session.principal;
    let c = contacts.get(3).expect("seeded contact 3");
    assert!(decide(Some(&p), &Operation::Reject, Some(&c)).succeeded());
    Ok(())
}
