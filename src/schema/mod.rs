//! Collection and index declarations.
//!
//! The schema is data, not code: backends read [`Schema::declared`] and make
//! it exist. Every statement rendered here is idempotent, so provisioning can
//! run on every deployment and from several processes at once.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Collection {
    Auctions,
    Bids,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Auctions, Collection::Bids, Collection::Users];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Auctions => "auctions",
            Collection::Bids => "bids",
            Collection::Users => "users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyKind {
    Ascending,
    Descending,
    /// Full-text over the field's words.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexKey {
    pub field: &'static str,
    pub kind: KeyKind,
}

const fn asc(field: &'static str) -> IndexKey {
    IndexKey {
        field,
        kind: KeyKind::Ascending,
    }
}

const fn desc(field: &'static str) -> IndexKey {
    IndexKey {
        field,
        kind: KeyKind::Descending,
    }
}

const fn text(field: &'static str) -> IndexKey {
    IndexKey {
        field,
        kind: KeyKind::Text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub name: &'static str,
    pub collection: Collection,
    pub keys: &'static [IndexKey],
    pub unique: bool,
    /// Backed by the collection's primary key; nothing to create.
    pub primary: bool,
}

impl IndexSpec {
    const fn new(name: &'static str, collection: Collection, keys: &'static [IndexKey]) -> Self {
        Self {
            name,
            collection,
            keys,
            unique: false,
            primary: false,
        }
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    const fn primary(mut self) -> Self {
        self.primary = true;
        self.unique = true;
        self
    }

    /// PostgreSQL DDL for this index, `None` when the primary key covers it.
    pub fn to_postgres_ddl(&self) -> Option<String> {
        if self.primary {
            return None;
        }
        let table = self.collection.name();
        let unique = if self.unique { "UNIQUE " } else { "" };

        if let [IndexKey {
            field,
            kind: KeyKind::Text,
        }] = self.keys
        {
            return Some(format!(
                "CREATE {unique}INDEX IF NOT EXISTS {} ON {table} USING GIN (to_tsvector('simple', {field}))",
                self.name
            ));
        }

        let columns = self
            .keys
            .iter()
            .map(|key| match key.kind {
                KeyKind::Descending => format!("{} DESC", key.field),
                KeyKind::Ascending | KeyKind::Text => key.field.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "CREATE {unique}INDEX IF NOT EXISTS {} ON {table} ({columns})",
            self.name
        ))
    }
}

const INDEXES: &[IndexSpec] = &[
    // catalog
    IndexSpec::new("idx_auctions_status", Collection::Auctions, &[asc("status")]),
    IndexSpec::new("idx_auctions_category", Collection::Auctions, &[asc("category")]),
    IndexSpec::new("idx_auctions_timestamp", Collection::Auctions, &[asc("timestamp")]),
    IndexSpec::new(
        "idx_auctions_product_name_text",
        Collection::Auctions,
        &[text("product_name")],
    ),
    // lifecycle sweep
    IndexSpec::new(
        "idx_auctions_status_ends_at",
        Collection::Auctions,
        &[asc("status"), asc("ends_at")],
    ),
    // history
    IndexSpec::new("idx_bids_auction_id", Collection::Bids, &[asc("auction_id")]),
    IndexSpec::new("idx_bids_user_id", Collection::Bids, &[asc("user_id")]),
    IndexSpec::new("idx_bids_amount_desc", Collection::Bids, &[desc("amount")]),
    IndexSpec::new("idx_bids_timestamp", Collection::Bids, &[asc("timestamp")]),
    // highest bid per auction
    IndexSpec::new(
        "idx_bids_auction_id_amount_desc",
        Collection::Bids,
        &[asc("auction_id"), desc("amount")],
    ),
    // ledger head, the compare-and-write token
    IndexSpec::new(
        "uq_bids_auction_id_sequence",
        Collection::Bids,
        &[asc("auction_id"), asc("sequence")],
    )
    .unique(),
    IndexSpec::new("pk_users_id", Collection::Users, &[asc("id")]).primary(),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub collections: &'static [Collection],
    pub indexes: &'static [IndexSpec],
}

impl Schema {
    pub fn declared() -> Self {
        Self {
            collections: &Collection::ALL,
            indexes: INDEXES,
        }
    }

    pub fn index(&self, name: &str) -> Option<&IndexSpec> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn indexes_on(&self, collection: Collection) -> impl Iterator<Item = &IndexSpec> + '_ {
        self.indexes.iter().filter(move |i| i.collection == collection)
    }

    pub fn postgres_index_ddl(&self) -> Vec<String> {
        self.indexes
            .iter()
            .filter_map(IndexSpec::to_postgres_ddl)
            .collect()
    }
}

/// What a backend reports as actually existing, used to check that
/// provisioning converged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDescription {
    /// Sorted.
    pub collections: Vec<String>,
    /// Sorted.
    pub indexes: Vec<String>,
}

impl SchemaDescription {
    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i == name)
    }
}
