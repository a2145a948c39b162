//! URI-addressed pet gateway.
//!
//! # Responsibility
//! - Resolve content URIs and dispatch query/type/insert/update/delete.
//! - Validate write payloads before the store is touched.
//! - Emit change notifications after mutations with a nonzero effect.
//!   Notifications and cursor registrations use the URI path without query
//!   or fragment.
//!
//! # Invariants
//! - Unrecognized URIs fail every operation with `UnrecognizedAddress`.
//! - Item addresses always target `_id = <id>`; caller selections are dropped.
//! - An empty update payload never reaches the store.
//! - Store failures on insert degrade to `Ok(None)`; on query, update and
//!   delete they propagate as `GatewayError::Store`.

mod cursor;
mod error;

pub use cursor::PetCursor;
pub use error::{GatewayError, GatewayResult, Operation};

use crate::address::{content_path, with_appended_id, Address, AddressMatcher};
use crate::config::GatewayConfig;
use crate::contract::{item_content_type, list_content_type, COLUMN_ID, PATH_PETS, TABLE_NAME};
use crate::db::open_location;
use crate::model::pet::PetValues;
use crate::notify::ChangeNotifier;
use crate::repo::pet_store::{Column, PetStore, SqlitePetStore, StoreError, StoreResult};
use log::{debug, error, info, warn};
use once_cell::unsync::OnceCell;
use rusqlite::types::Value;
use std::time::Instant;

type StoreOpener<S> = Box<dyn Fn() -> StoreResult<S>>;

/// Filter actually sent to the store after address resolution.
struct ResolvedFilter {
    selection: Option<String>,
    args: Vec<Value>,
}

impl ResolvedFilter {
    fn resolve(address: Address, selection: Option<&str>, selection_args: &[&str]) -> Self {
        match address {
            Address::Collection => Self {
                selection: selection.map(str::to_string),
                args: selection_args
                    .iter()
                    .map(|arg| Value::Text((*arg).to_string()))
                    .collect(),
            },
            Address::Item { id } => Self {
                selection: Some(format!("{COLUMN_ID} = ?")),
                args: vec![Value::Integer(id)],
            },
        }
    }
}

/// Mediates URI-addressed requests against the pets table.
pub struct PetGateway<S: PetStore> {
    authority: String,
    matcher: AddressMatcher,
    notifier: ChangeNotifier,
    store: OnceCell<S>,
    opener: Option<StoreOpener<S>>,
}

impl PetGateway<SqlitePetStore> {
    /// Builds a SQLite-backed gateway; the database opens on first use.
    pub fn open(config: &GatewayConfig, notifier: ChangeNotifier) -> Self {
        let location = config.db_location.clone();
        Self::new(
            config.authority.as_str(),
            notifier,
            move || -> StoreResult<SqlitePetStore> {
                Ok(SqlitePetStore::new(open_location(&location)?))
            },
        )
    }
}

impl<S: PetStore> PetGateway<S> {
    /// Creates a gateway that binds its store lazily through `opener`.
    ///
    /// A failed open is reported to the caller and retried on the next call.
    pub fn new(
        authority: &str,
        notifier: ChangeNotifier,
        opener: impl Fn() -> StoreResult<S> + 'static,
    ) -> Self {
        Self {
            authority: authority.to_string(),
            matcher: AddressMatcher::new(authority, PATH_PETS),
            notifier,
            store: OnceCell::new(),
            opener: Some(Box::new(opener)),
        }
    }

    /// Creates a gateway bound to an already-open store.
    pub fn with_store(authority: &str, notifier: ChangeNotifier, store: S) -> Self {
        Self {
            authority: authority.to_string(),
            matcher: AddressMatcher::new(authority, PATH_PETS),
            notifier,
            store: OnceCell::from(store),
            opener: None,
        }
    }

    /// Binds the backing store now instead of on first request.
    pub fn activate(&self) -> GatewayResult<()> {
        self.store().map(|_| ())
    }

    /// Returns whether the backing store has been bound.
    pub fn is_bound(&self) -> bool {
        self.store.get().is_some()
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Runs a query; item addresses ignore `selection` and `selection_args`.
    ///
    /// The returned cursor is registered for change notification on the path
    /// of `uri`.
    pub fn query(
        &self,
        uri: &str,
        projection: &[Column],
        selection: Option<&str>,
        selection_args: &[&str],
        sort_order: Option<&str>,
    ) -> GatewayResult<PetCursor> {
        let started_at = Instant::now();
        let address = self.resolve(Operation::Query, uri)?;
        let filter = ResolvedFilter::resolve(address, selection, selection_args);

        let rows = self
            .store()?
            .query(
                TABLE_NAME,
                projection,
                filter.selection.as_deref(),
                &filter.args,
                sort_order,
            )
            .map_err(|err| self.store_failed(Operation::Query, err))?;

        debug!(
            "event=pet_query module=gateway status=ok shape={} rows={} duration_ms={}",
            shape_label(address),
            rows.len(),
            started_at.elapsed().as_millis()
        );
        Ok(PetCursor::new(rows, content_path(uri), &self.notifier))
    }

    /// Returns the content type token for `uri`.
    pub fn type_of(&self, uri: &str) -> GatewayResult<String> {
        match self.resolve(Operation::TypeOf, uri)? {
            Address::Collection => Ok(list_content_type(&self.authority)),
            Address::Item { .. } => Ok(item_content_type(&self.authority)),
        }
    }

    /// Inserts one pet through the collection address.
    ///
    /// Returns the new item URI, or `None` when the store could not assign
    /// an id. Store failures are logged, not returned.
    ///
    /// # Errors
    /// - `UnsupportedOperation` for item addresses.
    /// - `Validation` when the payload breaks a field rule.
    pub fn insert(&self, uri: &str, values: &PetValues) -> GatewayResult<Option<String>> {
        match self.resolve(Operation::Insert, uri)? {
            Address::Collection => {}
            Address::Item { .. } => {
                return Err(self.rejected(GatewayError::UnsupportedOperation {
                    operation: Operation::Insert,
                    uri: uri.to_string(),
                }));
            }
        }

        values
            .validate_for_insert()
            .map_err(|err| self.rejected(err.into()))?;

        let id = match self.store()?.insert(TABLE_NAME, values) {
            Ok(id) => id,
            Err(err) => {
                error!(
                    "event=pet_insert module=gateway status=error error_code=insert_failed error={err}"
                );
                return Ok(None);
            }
        };

        self.notifier.notify(content_path(uri));
        info!("event=pet_insert module=gateway status=ok id={id}");
        Ok(Some(with_appended_id(uri, id)))
    }

    /// Applies a partial payload and returns the number of rows changed.
    ///
    /// An empty payload returns `0` without touching the store.
    pub fn update(
        &self,
        uri: &str,
        values: &PetValues,
        selection: Option<&str>,
        selection_args: &[&str],
    ) -> GatewayResult<usize> {
        let address = self.resolve(Operation::Update, uri)?;
        if values.is_empty() {
            debug!("event=pet_update module=gateway status=skip reason=empty_payload");
            return Ok(0);
        }
        values
            .validate_for_update()
            .map_err(|err| self.rejected(err.into()))?;

        let filter = ResolvedFilter::resolve(address, selection, selection_args);
        let changed = self
            .store()?
            .update(
                TABLE_NAME,
                values,
                filter.selection.as_deref(),
                &filter.args,
            )
            .map_err(|err| self.store_failed(Operation::Update, err))?;

        if changed != 0 {
            self.notifier.notify(content_path(uri));
        }
        info!(
            "event=pet_update module=gateway status=ok shape={} fields={} changed={changed}",
            shape_label(address),
            values.len()
        );
        Ok(changed)
    }

    /// Deletes matching rows and returns how many were removed.
    ///
    /// A collection address without selection removes every row.
    pub fn delete(
        &self,
        uri: &str,
        selection: Option<&str>,
        selection_args: &[&str],
    ) -> GatewayResult<usize> {
        let address = self.resolve(Operation::Delete, uri)?;
        let filter = ResolvedFilter::resolve(address, selection, selection_args);
        let deleted = self
            .store()?
            .delete(TABLE_NAME, filter.selection.as_deref(), &filter.args)
            .map_err(|err| self.store_failed(Operation::Delete, err))?;

        if deleted != 0 {
            self.notifier.notify(content_path(uri));
        }
        info!(
            "event=pet_delete module=gateway status=ok shape={} deleted={deleted}",
            shape_label(address)
        );
        Ok(deleted)
    }

    fn resolve(&self, operation: Operation, uri: &str) -> GatewayResult<Address> {
        self.matcher.resolve(uri).ok_or_else(|| {
            self.rejected(GatewayError::UnrecognizedAddress {
                operation,
                uri: uri.to_string(),
            })
        })
    }

    fn store(&self) -> GatewayResult<&S> {
        self.store
            .get_or_try_init(|| -> StoreResult<S> {
                match &self.opener {
                    Some(opener) => {
                        let store = opener()?;
                        info!("event=store_bind module=gateway status=ok");
                        Ok(store)
                    }
                    None => Err(StoreError::InvalidData(
                        "gateway has no store opener".to_string(),
                    )),
                }
            })
            .map_err(|err| {
                error!(
                    "event=store_bind module=gateway status=error error_code=store_open_failed error={err}"
                );
                GatewayError::Store(err)
            })
    }

    fn rejected(&self, err: GatewayError) -> GatewayError {
        warn!(
            "event=pet_request module=gateway status=rejected error_code={}",
            err.code()
        );
        err
    }

    fn store_failed(&self, operation: Operation, err: StoreError) -> GatewayError {
        error!(
            "event=pet_{operation} module=gateway status=error error_code=store_failed error={err}"
        );
        GatewayError::Store(err)
    }
}

fn shape_label(address: Address) -> &'static str {
    match address {
        Address::Collection => "collection",
        Address::Item { .. } => "item",
    }
}
