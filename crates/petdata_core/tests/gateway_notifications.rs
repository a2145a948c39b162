use petdata_core::contract::{pets_content_uri, CONTENT_AUTHORITY};
use petdata_core::{
    notification_channel, ChangeEvent, Gender, GatewayConfig, GatewayError, PetGateway,
    PetValues, SqlitePetStore, StoreError,
};
use std::cell::Cell;
use std::rc::Rc;

fn item_uri(id: i64) -> String {
    format!("{}/{id}", pets_content_uri())
}

fn rex() -> PetValues {
    PetValues::new().name("Rex").gender(Gender::Male).weight(10)
}

fn event(uri: &str) -> ChangeEvent {
    ChangeEvent {
        uri: uri.to_string(),
    }
}

#[test]
fn mutations_notify_the_addressed_uri() {
    let (notifier, dispatcher) = notification_channel();
    let gateway = PetGateway::with_store(
        CONTENT_AUTHORITY,
        notifier,
        SqlitePetStore::open_in_memory().unwrap(),
    );

    gateway.insert(&pets_content_uri(), &rex()).unwrap();
    gateway
        .update(&item_uri(1), &PetValues::new().weight(11), None, &[])
        .unwrap();
    gateway.delete(&item_uri(1), None, &[]).unwrap();

    assert_eq!(
        dispatcher.drain(),
        vec![
            event(&pets_content_uri()),
            event(&item_uri(1)),
            event(&item_uri(1)),
        ]
    );
}

#[test]
fn mutations_without_effect_do_not_notify() {
    let (notifier, dispatcher) = notification_channel();
    let gateway = PetGateway::with_store(
        CONTENT_AUTHORITY,
        notifier,
        SqlitePetStore::open_in_memory().unwrap(),
    );
    gateway.insert(&pets_content_uri(), &rex()).unwrap();
    dispatcher.drain();

    let deleted = gateway
        .delete(&pets_content_uri(), Some("gender = ?"), &["2"])
        .unwrap();
    assert_eq!(deleted, 0);
    let updated = gateway
        .update(&item_uri(42), &PetValues::new().weight(1), None, &[])
        .unwrap();
    assert_eq!(updated, 0);

    assert!(dispatcher.drain().is_empty());
}

#[test]
fn cursor_sees_changes_to_its_uri() {
    let (notifier, dispatcher) = notification_channel();
    let gateway = PetGateway::with_store(
        CONTENT_AUTHORITY,
        notifier.clone(),
        SqlitePetStore::open_in_memory().unwrap(),
    );
    gateway.insert(&pets_content_uri(), &rex()).unwrap();
    gateway.insert(&pets_content_uri(), &rex()).unwrap();
    dispatcher.dispatch_pending();

    let list = gateway
        .query(&pets_content_uri(), &[], None, &[], None)
        .unwrap();
    let first = gateway.query(&item_uri(1), &[], None, &[], None).unwrap();
    let second = gateway.query(&item_uri(2), &[], None, &[], None).unwrap();
    assert_eq!(list.notification_uri(), pets_content_uri());
    assert_eq!(notifier.observer_count(), 3);

    gateway
        .update(&item_uri(2), &PetValues::new().breed("Pug"), None, &[])
        .unwrap();
    assert!(!second.has_changed());
    assert_eq!(dispatcher.dispatch_pending(), 2);

    assert!(list.has_changed());
    assert!(!first.has_changed());
    assert!(second.has_changed());

    drop((list, first, second));
    assert_eq!(notifier.observer_count(), 0);
}

#[test]
fn store_binds_lazily_and_retries_failed_opens() {
    let (notifier, _dispatcher) = notification_channel();
    let attempts = Rc::new(Cell::new(0));
    let opener_attempts = Rc::clone(&attempts);
    let gateway = PetGateway::new(CONTENT_AUTHORITY, notifier, move || {
        opener_attempts.set(opener_attempts.get() + 1);
        if opener_attempts.get() == 1 {
            return Err(StoreError::InvalidData("disk not ready".to_string()));
        }
        SqlitePetStore::open_in_memory()
    });

    assert!(!gateway.is_bound());
    assert!(!gateway.type_of(&pets_content_uri()).unwrap().is_empty());
    assert_eq!(attempts.get(), 0);

    let err = gateway
        .query(&pets_content_uri(), &[], None, &[], None)
        .unwrap_err();
    assert!(matches!(err, GatewayError::Store(_)));
    assert!(!gateway.is_bound());

    gateway.activate().unwrap();
    assert!(gateway.is_bound());
    gateway.insert(&pets_content_uri(), &rex()).unwrap();
    assert_eq!(attempts.get(), 2);
}

#[test]
fn file_backed_gateway_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let config = GatewayConfig::with_db_file(dir.path().join("pets.db"));

    {
        let (notifier, _dispatcher) = notification_channel();
        let gateway = PetGateway::open(&config, notifier);
        let uri = gateway.insert(&pets_content_uri(), &rex()).unwrap();
        assert_eq!(uri, Some(item_uri(1)));
    }

    let (notifier, _dispatcher) = notification_channel();
    let gateway = PetGateway::open(&config, notifier);
    let pet = gateway
        .query(&item_uri(1), &[], None, &[], None)
        .unwrap()
        .next()
        .unwrap()
        .to_pet()
        .unwrap();
    assert_eq!(pet.name, "Rex");
    assert_eq!(pet.weight, Some(10));
}

#[test]
fn custom_authority_only_accepts_its_own_uris() {
    let (notifier, _dispatcher) = notification_channel();
    let gateway = PetGateway::with_store(
        "org.example.shelter",
        notifier,
        SqlitePetStore::open_in_memory().unwrap(),
    );

    assert_eq!(
        gateway.type_of("content://org.example.shelter/pets").unwrap(),
        "vnd.android.cursor.dir/org.example.shelter/pets"
    );
    assert!(matches!(
        gateway.type_of(&pets_content_uri()),
        Err(GatewayError::UnrecognizedAddress { .. })
    ));
}

#[test]
fn notifications_use_the_path_without_query() {
    let (notifier, dispatcher) = notification_channel();
    let gateway = PetGateway::with_store(
        CONTENT_AUTHORITY,
        notifier,
        SqlitePetStore::open_in_memory().unwrap(),
    );

    gateway
        .insert(&format!("{}?source=import", pets_content_uri()), &rex())
        .unwrap();
    let cursor = gateway
        .query(&format!("{}#top", item_uri(1)), &[], None, &[], None)
        .unwrap();
    assert_eq!(cursor.notification_uri(), item_uri(1));
    gateway.delete(&format!("{}/", item_uri(1)), None, &[]).unwrap();

    assert_eq!(
        dispatcher.drain(),
        vec![event(&pets_content_uri()), event(&item_uri(1))]
    );
}
