use axum::extract::Query;
use axum::Json;
use ps_common::api::ReturnsQuery;
use ps_common::money::{investment_returns, InvestmentReturns};

pub async fn returns(Query(query): Query<ReturnsQuery>) -> Json<InvestmentReturns> {
    Json(investment_returns(
        query.amount,
        query.launch_price,
        query.current_price,
    ))
}
