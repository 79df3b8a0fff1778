//! Bootstrap DDL, executed at startup.
//!
//! Schema *migrations* are an out-of-scope external collaborator; this
//! module only creates the tables a fresh database needs to run, issuing
//! `CREATE TABLE IF NOT EXISTS` statements by hand instead of shelling out
//! to a migration tool.

use sqlx::PgPool;

pub async fn bootstrap(pool: &PgPool) -> Result<(), sqlx::Error> {
    for stmt in STATEMENTS {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}

const STATEMENTS: &[&str] = &[
    r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp""#,
    r#"
    CREATE TABLE IF NOT EXISTS table_sessions (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        table_id UUID NOT NULL,
        status TEXT NOT NULL,
        guest_count INT NOT NULL DEFAULT 1,
        server_id UUID,
        version BIGINT NOT NULL DEFAULT 1,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS draft_orders (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        table_session_id UUID NOT NULL,
        status TEXT NOT NULL,
        version BIGINT NOT NULL DEFAULT 1,
        locked_by UUID,
        locked_at TIMESTAMPTZ,
        rejection_reason TEXT,
        confirmed_by UUID,
        order_id UUID,
        subtotal NUMERIC(12, 2) NOT NULL DEFAULT 0,
        tax_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
        discount_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
        service_charge NUMERIC(12, 2) NOT NULL DEFAULT 0,
        total_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
        tip_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
        special_requests TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        expires_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_draft_orders_tenant ON draft_orders(tenant_id)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_draft_orders_status ON draft_orders(status)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_draft_orders_expires ON draft_orders(expires_at)"#,
    r#"
    CREATE TABLE IF NOT EXISTS draft_line_items (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        draft_order_id UUID NOT NULL REFERENCES draft_orders(id) ON DELETE CASCADE,
        menu_item_id UUID NOT NULL,
        name TEXT NOT NULL,
        quantity INT NOT NULL,
        price_at_order NUMERIC(10, 2) NOT NULL,
        line_total NUMERIC(10, 2) NOT NULL,
        modifiers JSONB NOT NULL DEFAULT '[]',
        special_instructions TEXT,
        sort_order INT NOT NULL DEFAULT 0,
        parent_line_item_id UUID
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_draft_line_items_draft ON draft_line_items(draft_order_id)"#,
    r#"
    CREATE TABLE IF NOT EXISTS menu_stations (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        name TEXT NOT NULL,
        printer_ids JSONB NOT NULL DEFAULT '[]'
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS kitchen_courses (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        name TEXT NOT NULL,
        course_number INT NOT NULL,
        auto_fire_on_confirm BOOLEAN NOT NULL DEFAULT false
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS menu_items (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        price NUMERIC(10, 2) NOT NULL,
        station_id UUID REFERENCES menu_stations(id),
        course_id UUID REFERENCES kitchen_courses(id)
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        table_session_id UUID NOT NULL,
        draft_order_id UUID NOT NULL UNIQUE,
        status TEXT NOT NULL,
        version BIGINT NOT NULL DEFAULT 1,
        subtotal NUMERIC(12, 2) NOT NULL,
        tax_amount NUMERIC(12, 2) NOT NULL,
        discount_amount NUMERIC(12, 2) NOT NULL,
        service_charge NUMERIC(12, 2) NOT NULL,
        total_amount NUMERIC(12, 2) NOT NULL,
        tip_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        completed_at TIMESTAMPTZ
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_orders_tenant ON orders(tenant_id)"#,
    r#"
    CREATE TABLE IF NOT EXISTS order_line_items (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        menu_item_id UUID NOT NULL,
        name TEXT NOT NULL,
        quantity INT NOT NULL,
        price_at_order NUMERIC(10, 2) NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending'
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS tickets (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        draft_order_id UUID NOT NULL,
        order_id UUID,
        station_id UUID NOT NULL,
        course_id UUID NOT NULL,
        course_number INT NOT NULL,
        status TEXT NOT NULL,
        version BIGINT NOT NULL DEFAULT 1,
        is_held BOOLEAN NOT NULL DEFAULT false,
        held_reason TEXT,
        held_at TIMESTAMPTZ,
        is_rush BOOLEAN NOT NULL DEFAULT false,
        fired_at TIMESTAMPTZ,
        voided_at TIMESTAMPTZ,
        voided_reason TEXT,
        print_count INT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_tickets_tenant ON tickets(tenant_id)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_tickets_draft ON tickets(draft_order_id)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_tickets_station_created ON tickets(station_id, created_at)"#,
    r#"
    CREATE TABLE IF NOT EXISTS ticket_line_items (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        ticket_id UUID NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
        draft_line_item_id UUID NOT NULL,
        menu_item_id UUID NOT NULL,
        name TEXT NOT NULL,
        quantity INT NOT NULL,
        modifiers JSONB NOT NULL DEFAULT '[]',
        special_instructions TEXT,
        course_number INT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        held BOOLEAN NOT NULL DEFAULT false,
        voided BOOLEAN NOT NULL DEFAULT false
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS payment_intents (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        order_id UUID NOT NULL,
        status TEXT NOT NULL,
        version BIGINT NOT NULL DEFAULT 1,
        method TEXT NOT NULL,
        amount NUMERIC(12, 2) NOT NULL,
        currency TEXT NOT NULL DEFAULT 'USD',
        idempotency_key TEXT UNIQUE,
        qr_code TEXT,
        qr_expires_at TIMESTAMPTZ,
        tip_amount NUMERIC(10, 2),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_payment_intents_order ON payment_intents(order_id)"#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        payment_intent_id UUID NOT NULL,
        method TEXT NOT NULL,
        amount NUMERIC(12, 2) NOT NULL,
        status TEXT NOT NULL,
        version BIGINT NOT NULL DEFAULT 1,
        refunded_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS order_payments (
        order_id UUID NOT NULL,
        payment_id UUID NOT NULL UNIQUE,
        allocated_amount NUMERIC(12, 2) NOT NULL,
        PRIMARY KEY (order_id, payment_id)
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS refunds (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        payment_id UUID NOT NULL,
        amount NUMERIC(12, 2) NOT NULL,
        reason_code TEXT NOT NULL,
        reason TEXT,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS shifts (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        server_id UUID NOT NULL,
        status TEXT NOT NULL,
        version BIGINT NOT NULL DEFAULT 1,
        opening_balance NUMERIC(12, 2) NOT NULL,
        cash_sales NUMERIC(12, 2) NOT NULL DEFAULT 0,
        card_sales NUMERIC(12, 2) NOT NULL DEFAULT 0,
        tip_sales NUMERIC(12, 2) NOT NULL DEFAULT 0,
        closing_cash_count NUMERIC(12, 2),
        card_count NUMERIC(12, 2),
        expected_cash NUMERIC(12, 2),
        cash_variance NUMERIC(12, 2),
        is_over BOOLEAN,
        reconciled_by UUID,
        opened_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        closed_at TIMESTAMPTZ,
        reconciled_at TIMESTAMPTZ
    )"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_shifts_one_active_per_server
        ON shifts(tenant_id, server_id) WHERE status = 'active'"#,
    r#"
    CREATE TABLE IF NOT EXISTS cash_drawer_events (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        shift_id UUID NOT NULL REFERENCES shifts(id) ON DELETE CASCADE,
        event_type TEXT NOT NULL,
        amount NUMERIC(12, 2) NOT NULL,
        balance_after NUMERIC(12, 2) NOT NULL,
        payment_id UUID,
        order_id UUID,
        performed_by UUID NOT NULL,
        approved_by UUID,
        reason TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        sequence BIGSERIAL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_cash_events_shift ON cash_drawer_events(shift_id, sequence)"#,
    r#"
    CREATE TABLE IF NOT EXISTS order_adjustments (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        order_id UUID NOT NULL,
        order_line_item_id UUID,
        adjustment_type TEXT NOT NULL,
        amount NUMERIC(12, 2) NOT NULL,
        authorized_by UUID NOT NULL,
        reason TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS webhook_logs (
        id UUID PRIMARY KEY,
        provider TEXT NOT NULL,
        external_reference TEXT NOT NULL,
        action_type TEXT NOT NULL,
        status TEXT NOT NULL,
        payload JSONB,
        processed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (provider, external_reference)
    )"#,
];
