use order_manager::{
    config::AppConfig,
    db::connect_store,
    dto::orders::{CartItemRequest, CompleteOrderRequest, NewOrderRequest, RecipientRequest},
    services::order_service,
    state::AppState,
};

/// Places one demo order with two lines and a recipient record.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let store = connect_store(&config).await?;
    let state = AppState::new(store, config.store.clone(), config.retry_policy());

    let order = order_service::create_complete_order(
        &state,
        CompleteOrderRequest {
            order: NewOrderRequest {
                customer_id: Some("demo-customer".into()),
                branch_id: Some("main-branch".into()),
                delivery_name: Some("Demo Customer".into()),
                delivery_address: Some("1 Market Street".into()),
                payment_method: Some("cash".into()),
                total: Some(37.5.into()),
                ..Default::default()
            },
            items: vec![
                CartItemRequest {
                    id: Some("prod-roses".into()),
                    name: Some("Red roses".into()),
                    price: Some(12.5.into()),
                    quantity: Some(2.0.into()),
                    ..Default::default()
                },
                CartItemRequest {
                    id: Some("prod-card".into()),
                    name: Some("Greeting card".into()),
                    price: Some(12.5.into()),
                    ..Default::default()
                },
            ],
            recipient: Some(RecipientRequest {
                recipient_name: Some("Demo Recipient".into()),
                ..Default::default()
            }),
            ..Default::default()
        },
    )
    .await
    .map_err(|err| anyhow::anyhow!("seeding failed: {err}"))?;

    println!(
        "Seed completed. Order ID: {}, items: {}",
        order.order.id,
        order.items.len()
    );
    Ok(())
}
