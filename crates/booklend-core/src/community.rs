//! Reader reviews and the acquisition wishlist

use chrono::Utc;
use tracing::info;

use crate::engine::Library;
use crate::error::{LendingError, Result};
use crate::model::{Actor, BookId, NewReview, NewWish, Review, WishId, WishItem, WishStatus};
use crate::store::{RecordStore, StatusFilter};

impl Library {
    /// Reviews of a book, newest first
    pub fn reviews(&self, book_id: BookId) -> Result<Vec<Review>> {
        self.repo()
            .read(|session| session.reviews_for_book(book_id))
    }

    /// Review a book; one review per reader per book
    pub fn add_review(&mut self, actor: &Actor, book_id: BookId, input: NewReview) -> Result<Review> {
        let review = self.repo_mut().transaction(|session| {
            if session.book(book_id)?.is_none() {
                return Err(LendingError::not_found("Book", book_id));
            }
            let review = Review::new(book_id, actor.user_id, input, Utc::now())?;
            if session.review_by(book_id, actor.user_id)?.is_some() {
                return Err(LendingError::Validation(
                    "you have already reviewed this book".to_string(),
                ));
            }
            session.insert_review(&review)?;
            Ok(review)
        })?;
        info!(book = %book_id, user = %actor.user_id, rating = review.rating, "Review added");
        Ok(review)
    }

    /// The caller's wishlist, newest first
    pub fn my_wishes(&self, actor: &Actor) -> Result<Vec<WishItem>> {
        self.repo()
            .read(|session| session.wishes(&StatusFilter::all().owned_by(actor.user_id)))
    }

    pub fn add_wish(&mut self, actor: &Actor, input: NewWish) -> Result<WishItem> {
        let wish = WishItem::new(actor.user_id, input, Utc::now())?;
        self.repo_mut()
            .transaction(|session| session.save_wish(&wish))?;
        Ok(wish)
    }

    /// Remove one of the caller's own wishlist entries
    pub fn delete_wish(&mut self, actor: &Actor, id: WishId) -> Result<()> {
        self.repo_mut().transaction(|session| {
            let wish = session
                .wish(id)?
                .ok_or_else(|| LendingError::not_found("WishItem", id))?;
            if wish.user_id != actor.user_id {
                return Err(LendingError::Forbidden(
                    "only the owner can delete this wish".to_string(),
                ));
            }
            session.delete_wish(id)?;
            Ok(())
        })
    }

    /// Every wishlist entry, optionally narrowed to one status
    pub fn all_wishes(&self, actor: &Actor, status: Option<WishStatus>) -> Result<Vec<WishItem>> {
        actor.require_admin("list wishlists")?;
        self.repo()
            .read(|session| session.wishes(&StatusFilter::all().status_opt(status)))
    }

    pub fn fulfill_wish(&mut self, actor: &Actor, id: WishId) -> Result<WishItem> {
        self.decide_wish(actor, id, WishStatus::Fulfilled)
    }

    pub fn reject_wish(&mut self, actor: &Actor, id: WishId) -> Result<WishItem> {
        self.decide_wish(actor, id, WishStatus::Rejected)
    }

    fn decide_wish(&mut self, actor: &Actor, id: WishId, status: WishStatus) -> Result<WishItem> {
        actor.require_admin("decide wishlist entries")?;
        let wish = self.repo_mut().transaction(|session| {
            let mut wish = session
                .wish(id)?
                .ok_or_else(|| LendingError::not_found("WishItem", id))?;
            wish.transition_to(status)?;
            session.save_wish(&wish)?;
            Ok(wish)
        })?;
        info!(wish = %id, status = %wish.status, "Wish decided");
        Ok(wish)
    }
}
