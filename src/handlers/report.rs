use axum::{extract::{Query, State}, Json};
use chrono::Local;
use crate::state::AppState;
use crate::error::AppError;
use crate::dtos::report::{ReportListItem, ReportQuery, ReportResponse, ReportRows, ReportType, TotalsQuery};
use crate::reports::{self, DateRange, PeriodHint, PgReportStore, ReportTotals};
use crate::reports::filter::parse_date;

pub async fn get_reports(
    State(AppState { db_pool }): State<AppState>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<ReportResponse>, AppError> {
    let store = PgReportStore::new(db_pool);
    let filter = params.filter();
    let report_type = params.report_type();
    let now = Local::now().naive_local();

    let rows = match report_type {
        ReportType::All => ReportRows::Records(
            reports::list_reports(&store, &filter)
                .await?
                .into_iter()
                .map(ReportListItem::from)
                .collect(),
        ),
        ReportType::Daily => ReportRows::Periods(reports::aggregate_by_day(&store, &filter).await?),
        ReportType::Monthly => ReportRows::Periods(reports::aggregate_by_month(&store, &filter, now).await?),
        ReportType::Yearly => ReportRows::Periods(reports::aggregate_by_year(&store, &filter, now).await?),
    };

    Ok(Json(ReportResponse { report_type, reports: rows }))
}

pub async fn get_report_totals(
    State(AppState { db_pool }): State<AppState>,
    Query(params): Query<TotalsQuery>,
) -> Result<Json<ReportTotals>, AppError> {
    let store = PgReportStore::new(db_pool);
    let range = DateRange::new(
        parse_date(params.start_date.as_deref()),
        parse_date(params.end_date.as_deref()),
    );
    let hint = PeriodHint::parse(params.period.as_deref());
    let today = Local::now().date_naive();

    reports::compute_totals(&store, range, hint, today).await.map(Json)
}
