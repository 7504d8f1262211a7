use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dock Ledger API",
        version = "1.0.0",
        description = r#"
# Dock Ledger API

Daily truck-unloading ledger for a receiving dock.

## Features

- **Catalog**: companies and products with case-insensitive get-or-create
- **Unloading**: one event per truck arrival, with line items converted to pallet equivalents
- **Day closing**: closing freezes the day total and blocks changes until the day is reopened
- **Reports**: a day's events grouped by company, plus printable plain-text documents
- **Attendance**: employee check-in and check-out

## Error Handling

Failures return a consistent body. `kind` is the machine-checkable code:

```json
{
  "error": "Conflict",
  "kind": "ledger_closed",
  "message": "Day 2024-12-09 is closed; reopen it before making changes",
  "timestamp": "2024-12-09T18:30:00Z"
}
```

## Rounding

Line items and event totals keep 4 decimal places. Day totals and company subtotals keep 2.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "catalog", description = "Companies and products"),
        (name = "unloading", description = "Truck arrivals and the day state machine"),
        (name = "reports", description = "Grouped day detail and exports"),
        (name = "attendance", description = "Employees and daily attendance")
    ),
    paths(
        crate::handlers::catalog::create_company,
        crate::handlers::catalog::search_companies,
        crate::handlers::catalog::delete_company,
        crate::handlers::catalog::create_product,
        crate::handlers::catalog::list_products,

        crate::handlers::unloading::day_summary,
        crate::handlers::unloading::register_event,
        crate::handlers::unloading::get_event,
        crate::handlers::unloading::delete_event,
        crate::handlers::unloading::event_receipt,
        crate::handlers::unloading::close_day,
        crate::handlers::unloading::reopen_day,
        crate::handlers::unloading::list_ledgers,

        crate::handlers::reports::view_day,
        crate::handlers::reports::export_day,

        crate::handlers::attendance::create_employee,
        crate::handlers::attendance::check_in,
        crate::handlers::attendance::check_out,
        crate::handlers::attendance::attendance_overview,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::entities::day_ledger::LedgerState,
            crate::entities::unloading_event::EventType,
            crate::entities::product::ProductCategory,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
