//! Cash ledger schema.
//!
//! Creates the category directory, cash days, movements and the day audit
//! trail, plus the triggers that keep closed days immutable at the storage
//! level.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // PART 1: ENUM TYPES
        db.execute_unprepared(ENUMS_SQL).await?;

        // PART 2: TABLES
        db.execute_unprepared(TABLES_SQL).await?;

        // PART 3: TRIGGERS & FUNCTIONS
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE cash_day_status AS ENUM ('OPEN', 'CLOSED');

CREATE TYPE cash_movement_type AS ENUM ('INCOME', 'EXPENSE');

CREATE TYPE payment_method AS ENUM ('CASH', 'TRANSFER', 'CARD', 'OTHER');

CREATE TYPE cash_day_audit_action AS ENUM (
    'OPENED',
    'OPENING_CASH_SET',
    'CLOSED',
    'ANNOTATED'
);
";

const TABLES_SQL: &str = r"
-- ============================================================
-- Category directory (owned by back-office, read-only here)
-- ============================================================
CREATE TABLE cash_categories (
    id UUID PRIMARY KEY,
    branch_id UUID NOT NULL,
    name VARCHAR(120) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_cash_categories_branch_name UNIQUE (branch_id, name)
);

CREATE INDEX idx_cash_categories_branch ON cash_categories(branch_id);

-- ============================================================
-- One cash day per branch and calendar date
-- ============================================================
CREATE TABLE cash_days (
    id UUID PRIMARY KEY,
    branch_id UUID NOT NULL,
    date_key DATE NOT NULL,
    status cash_day_status NOT NULL DEFAULT 'OPEN',
    opening_cash NUMERIC(19, 4) NOT NULL DEFAULT 0,
    expected_cash NUMERIC(19, 4),
    counted_cash NUMERIC(19, 4),
    diff_cash NUMERIC(19, 4),
    closed_by_override BOOLEAN NOT NULL DEFAULT FALSE,
    close_note TEXT,
    opened_at TIMESTAMPTZ NOT NULL,
    opened_by UUID NOT NULL,
    closed_at TIMESTAMPTZ,
    closed_by UUID,
    CONSTRAINT uq_cash_days_branch_date UNIQUE (branch_id, date_key),
    CONSTRAINT chk_opening_cash_non_negative CHECK (opening_cash >= 0),
    CONSTRAINT chk_counted_cash_non_negative CHECK (counted_cash IS NULL OR counted_cash >= 0),
    CONSTRAINT chk_diff_requires_count CHECK ((counted_cash IS NULL) = (diff_cash IS NULL)),
    CONSTRAINT chk_closing_fields CHECK (
        (status = 'OPEN'
            AND closed_at IS NULL AND closed_by IS NULL
            AND expected_cash IS NULL AND counted_cash IS NULL)
        OR
        (status = 'CLOSED'
            AND closed_at IS NOT NULL AND closed_by IS NOT NULL
            AND expected_cash IS NOT NULL)
    )
);

CREATE INDEX idx_cash_days_branch_date ON cash_days(branch_id, date_key DESC);

-- ============================================================
-- Movements: append-only, void stamp set once
-- ============================================================
CREATE TABLE cash_movements (
    id UUID PRIMARY KEY,
    cash_day_id UUID NOT NULL REFERENCES cash_days(id) ON DELETE RESTRICT,
    movement_type cash_movement_type NOT NULL,
    method payment_method NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    category_id UUID,
    concept VARCHAR(200) NOT NULL,
    note TEXT,
    voided BOOLEAN NOT NULL DEFAULT FALSE,
    void_reason TEXT,
    voided_at TIMESTAMPTZ,
    voided_by UUID,
    created_at TIMESTAMPTZ NOT NULL,
    created_by UUID NOT NULL,
    CONSTRAINT chk_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_concept_not_blank CHECK (btrim(concept) <> ''),
    CONSTRAINT chk_void_stamp CHECK (
        (voided AND voided_at IS NOT NULL AND voided_by IS NOT NULL)
        OR
        (NOT voided AND voided_at IS NULL AND voided_by IS NULL AND void_reason IS NULL)
    )
);

CREATE INDEX idx_cash_movements_day ON cash_movements(cash_day_id, created_at, id);

-- ============================================================
-- Day audit trail
-- ============================================================
CREATE TABLE cash_day_audit (
    id UUID PRIMARY KEY,
    cash_day_id UUID NOT NULL REFERENCES cash_days(id) ON DELETE RESTRICT,
    action cash_day_audit_action NOT NULL,
    amount NUMERIC(19, 4),
    note TEXT,
    actor_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX idx_cash_day_audit_day ON cash_day_audit(cash_day_id, created_at, id);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: guard_cash_day_update
-- A closed day never changes; identity columns never change
-- ============================================================
CREATE OR REPLACE FUNCTION guard_cash_day_update()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.status = 'CLOSED' THEN
        RAISE EXCEPTION 'Cannot modify closed cash day %', OLD.id;
    END IF;

    IF NEW.branch_id <> OLD.branch_id OR NEW.date_key <> OLD.date_key THEN
        RAISE EXCEPTION 'Cannot change branch or date of cash day %', OLD.id;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_guard_cash_day_update
BEFORE UPDATE ON cash_days
FOR EACH ROW
EXECUTE FUNCTION guard_cash_day_update();

-- ============================================================
-- FUNCTION: guard_cash_movement_write
-- Movements are written only while their day is open; updates may
-- only set the void stamp, exactly once
-- ============================================================
CREATE OR REPLACE FUNCTION guard_cash_movement_write()
RETURNS TRIGGER AS $$
DECLARE
    day_status cash_day_status;
BEGIN
    SELECT status INTO day_status FROM cash_days WHERE id = NEW.cash_day_id;

    IF day_status = 'CLOSED' THEN
        RAISE EXCEPTION 'Cash day % is closed', NEW.cash_day_id;
    END IF;

    IF TG_OP = 'UPDATE' THEN
        IF OLD.voided THEN
            RAISE EXCEPTION 'Cash movement % is already voided', OLD.id;
        END IF;

        IF NEW.cash_day_id <> OLD.cash_day_id
            OR NEW.movement_type <> OLD.movement_type
            OR NEW.method <> OLD.method
            OR NEW.amount <> OLD.amount
            OR NEW.category_id IS DISTINCT FROM OLD.category_id
            OR NEW.concept <> OLD.concept
            OR NEW.note IS DISTINCT FROM OLD.note
            OR NEW.created_at <> OLD.created_at
            OR NEW.created_by <> OLD.created_by
        THEN
            RAISE EXCEPTION 'Only the void stamp of cash movement % may change', OLD.id;
        END IF;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_guard_cash_movement_write
BEFORE INSERT OR UPDATE ON cash_movements
FOR EACH ROW
EXECUTE FUNCTION guard_cash_movement_write();

-- ============================================================
-- FUNCTION: prevent_ledger_delete
-- Movements and audit entries are never physically removed
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_delete()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Rows of % are never deleted', TG_TABLE_NAME;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_cash_movement_delete
BEFORE DELETE ON cash_movements
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_delete();

CREATE TRIGGER trg_prevent_cash_day_audit_delete
BEFORE DELETE ON cash_day_audit
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_delete();

-- ============================================================
-- FUNCTION: prevent_audit_update
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_audit_update()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Cash day audit entries are append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_cash_day_audit_update
BEFORE UPDATE ON cash_day_audit
FOR EACH ROW
EXECUTE FUNCTION prevent_audit_update();
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS cash_day_audit CASCADE;
DROP TABLE IF EXISTS cash_movements CASCADE;
DROP TABLE IF EXISTS cash_days CASCADE;
DROP TABLE IF EXISTS cash_categories CASCADE;

DROP FUNCTION IF EXISTS prevent_audit_update();
DROP FUNCTION IF EXISTS prevent_ledger_delete();
DROP FUNCTION IF EXISTS guard_cash_movement_write();
DROP FUNCTION IF EXISTS guard_cash_day_update();

DROP TYPE IF EXISTS cash_day_audit_action;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS cash_movement_type;
DROP TYPE IF EXISTS cash_day_status;
";
