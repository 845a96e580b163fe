use uuid::Uuid;

use crate::dto::booking_dto::{CreateBookingRequest, UpdateBookingStatusRequest, UpdatePaymentStatusRequest};
use crate::dto::ApiResponse;
use crate::models::{
    booking::{Booking, BookingSummary},
    payment::Payment,
};
use crate::services::{BookingService, ExpiryService, PaymentService, SweepReport};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct BookingController {
    bookings: BookingService,
    payments: PaymentService,
    expiry: ExpiryService,
}

impl BookingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            bookings: state.booking_service(),
            payments: state.payment_service(),
            expiry: state.expiry_service(),
        }
    }

    // --- Cliente ---

    pub async fn create(
        &self,
        customer_id: Uuid,
        request: CreateBookingRequest,
    ) -> Result<ApiResponse<Booking>, AppError> {
        let command = request.into_command(customer_id)?;
        let booking = self.bookings.create_booking(command).await?;
        Ok(ApiResponse::success_with_message(
            booking,
            "Booking confirmed; complete the payment to keep it",
        ))
    }

    pub async fn list_for_customer(&self, customer_id: Uuid) -> Result<ApiResponse<Vec<BookingSummary>>, AppError> {
        let bookings = self.bookings.list_customer_bookings(customer_id).await?;
        Ok(ApiResponse::success(bookings))
    }

    pub async fn get_for_customer(
        &self,
        booking_id: Uuid,
        customer_id: Uuid,
    ) -> Result<ApiResponse<BookingSummary>, AppError> {
        let booking = self.bookings.get_booking(booking_id, customer_id).await?;
        Ok(ApiResponse::success(booking))
    }

    pub async fn cancel(&self, booking_id: Uuid, customer_id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.bookings.cancel_by_customer(booking_id, customer_id).await?;
        Ok(ApiResponse::message("Booking cancelled"))
    }

    pub async fn pay(&self, booking_id: Uuid, customer_id: Uuid) -> Result<ApiResponse<Payment>, AppError> {
        let payment = self.payments.pay(booking_id, customer_id).await?;
        Ok(ApiResponse::success_with_message(payment, "Payment recorded"))
    }

    // --- Personal ---

    pub async fn list_all(&self) -> Result<ApiResponse<Vec<BookingSummary>>, AppError> {
        let bookings = self.bookings.list_all_bookings().await?;
        Ok(ApiResponse::success(bookings))
    }

    pub async fn update_status(
        &self,
        booking_id: Uuid,
        request: UpdateBookingStatusRequest,
    ) -> Result<ApiResponse<Booking>, AppError> {
        let booking = self.bookings.transition_status(booking_id, &request.status).await?;
        Ok(ApiResponse::success(booking))
    }

    pub async fn update_payment_status(
        &self,
        booking_id: Uuid,
        request: UpdatePaymentStatusRequest,
    ) -> Result<ApiResponse<Option<Payment>>, AppError> {
        let payment = self
            .payments
            .set_payment_status(booking_id, request.payment_status())
            .await?;
        Ok(ApiResponse::success(payment))
    }

    pub async fn sweep(&self) -> Result<ApiResponse<SweepReport>, AppError> {
        let report = self.expiry.sweep_expired().await?;
        Ok(ApiResponse::success(report))
    }
}
