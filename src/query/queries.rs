/// Provisioning lock, serializes concurrent provisioners on the catalog
pub const PROVISION_LOCK: &str = "SELECT pg_advisory_xact_lock($1)";

/// Existing collections
pub const DESCRIBE_TABLES: &str = "SELECT table_name::text AS name FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = ANY($1) ORDER BY 1";

/// Existing indexes
pub const DESCRIBE_INDEXES: &str = "SELECT indexname::text AS name FROM pg_indexes WHERE schemaname = current_schema() AND tablename = ANY($1) ORDER BY 1";

/// Insert user
pub const INSERT_USER: &str = "INSERT INTO users (id, name) VALUES ($1, $2)";

/// Get user
pub const GET_USER: &str = "SELECT id, name FROM users WHERE id = $1";

/// Insert auction
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (id, product_name, category, description, condition, status, timestamp, starts_at, ends_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

/// Get auction
pub const GET_AUCTION: &str = "SELECT id, product_name, category, description, condition, status, timestamp, starts_at, ends_at FROM auctions WHERE id = $1";

/// Catalog listing; every filter is optional
pub const LIST_AUCTIONS: &str = r#"
    SELECT id, product_name, category, description, condition, status, timestamp, starts_at, ends_at
    FROM auctions
    WHERE ($1::smallint IS NULL OR status = $1)
      AND ($2::text IS NULL OR category = $2)
      AND ($3::bigint IS NULL OR timestamp >= $3)
      AND ($4::bigint IS NULL OR timestamp < $4)
    ORDER BY timestamp, id
    LIMIT $5 OFFSET $6
"#;

/// Full-text product search over the GIN index
pub const SEARCH_AUCTIONS: &str = r#"
    SELECT id, product_name, category, description, condition, status, timestamp, starts_at, ends_at
    FROM auctions
    WHERE to_tsvector('simple', product_name) @@ plainto_tsquery('simple', $1)
    ORDER BY timestamp, id
    LIMIT $2
"#;

/// Auctions due for a lifecycle transition
pub const DUE_AUCTIONS: &str = r#"
    SELECT id, product_name, category, description, condition, status, timestamp, starts_at, ends_at
    FROM auctions
    WHERE (status = $1 AND starts_at <= $3)
       OR (status = $2 AND ends_at <= $3)
    ORDER BY ends_at, id
"#;

/// Conditional status change
pub const UPDATE_STATUS: &str = "UPDATE auctions SET status = $3 WHERE id = $1 AND status = $2";

/// Highest bid, served by (auction_id, amount DESC)
pub const GET_HIGHEST_BID: &str = r#"
    SELECT id, user_id, auction_id, amount, timestamp, sequence
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC
    LIMIT 1
"#;

/// Auction row lock held for the rest of a bid append; status updates wait
/// for it, so a bid either commits before a close or sees the closed status
pub const LOCK_AUCTION_FOR_BID: &str = "SELECT id FROM auctions WHERE id = $1 FOR SHARE";

/// Conditional append. Writes nothing unless the auction is still open at
/// the bid's timestamp, the ledger head is at `$6 - 1` and no recorded bid
/// has an amount at or above the candidate's. Two writers racing on the same
/// head collide on the (auction_id, sequence) unique index and one gets no
/// row back.
pub const APPEND_BID: &str = r#"
    INSERT INTO bids (id, user_id, auction_id, amount, timestamp, sequence)
    SELECT $1, $2, a.id, $4, $5, $6
    FROM auctions a
    WHERE a.id = $3
      AND a.status = $7
      AND a.starts_at <= $5
      AND a.ends_at > $5
      AND COALESCE((SELECT MAX(h.sequence) FROM bids h WHERE h.auction_id = $3), 0) = $6 - 1
      AND NOT EXISTS (
          SELECT 1 FROM bids b
          WHERE b.auction_id = $3 AND b.amount >= $4
      )
    ON CONFLICT (auction_id, sequence) DO NOTHING
    RETURNING id
"#;

/// Auction bid ledger
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, user_id, auction_id, amount, timestamp, sequence
    FROM bids
    WHERE auction_id = $1
    ORDER BY sequence
"#;

/// User bid history
pub const GET_USER_BIDS: &str = r#"
    SELECT id, user_id, auction_id, amount, timestamp, sequence
    FROM bids
    WHERE user_id = $1
    ORDER BY timestamp DESC, auction_id, sequence DESC
"#;
