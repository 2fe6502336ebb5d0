use async_trait::async_trait;
use chrono::Utc;
use farled_core::booking::{Booking, BookingStatus};
use farled_core::store::{BookingOps, BoxError};
use uuid::Uuid;

use super::PgTx;

#[async_trait]
impl BookingOps for PgTx {
    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), BoxError> {
        sqlx::query(
            "INSERT INTO booking (id, order_id, sailing_id, customer_name, id_type, id_number, \
             phone_number, email, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(booking.id)
        .bind(&booking.order_id)
        .bind(booking.sailing_id)
        .bind(&booking.customer_name)
        .bind(&booking.id_type)
        .bind(&booking.id_number)
        .bind(&booking.phone_number)
        .bind(&booking.email)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_booking_status(
        &mut self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), BoxError> {
        sqlx::query("UPDATE booking SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(Utc::now())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }
}
