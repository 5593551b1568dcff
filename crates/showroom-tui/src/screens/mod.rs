//! Screen implementations. Each screen is a top-level Component.

pub mod admin_cars;
pub mod admin_home;
pub mod admin_reviews;
pub mod admin_users;
pub mod home;
pub mod login;
pub mod reviews;
pub mod showcase;
pub mod signup;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use showroom_core::{DocumentId, ReviewSort, Showroom};

use crate::action::Action;
use crate::component::Component;
use crate::screen::ScreenId;

/// Create all screen components.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Home, Box::new(home::HomeScreen::new())),
        (ScreenId::Showcase, Box::new(showcase::ShowcaseScreen::new())),
        (ScreenId::Reviews, Box::new(reviews::ReviewsScreen::new())),
        (ScreenId::Login, Box::new(login::LoginScreen::new())),
        (ScreenId::Signup, Box::new(signup::SignupScreen::new())),
        (
            ScreenId::AdminHome,
            Box::new(admin_home::AdminHomeScreen::new()),
        ),
        (
            ScreenId::AdminCars,
            Box::new(admin_cars::AdminCarsScreen::new()),
        ),
        (
            ScreenId::AdminUsers,
            Box::new(admin_users::AdminUsersScreen::new()),
        ),
        (
            ScreenId::AdminReviews,
            Box::new(admin_reviews::AdminReviewsScreen::new()),
        ),
    ]
}

/// Spawn a review/author board and forward its snapshots as
/// [`Action::BoardUpdated`] until `cancel` fires.
///
/// This is the mount-side acquire; the owning screen's `unmount` cancels
/// the token, which tears the board down and guarantees no update is
/// forwarded afterwards.
pub(crate) fn spawn_board_forward(
    showroom: &Showroom,
    car: Option<DocumentId>,
    sort: ReviewSort,
    owner: ScreenId,
    action_tx: UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let showroom = showroom.clone();
    tokio::spawn(async move {
        let mut board = showroom.review_board(car, sort, cancel.child_token());
        let _ = action_tx.send(Action::BoardUpdated {
            owner,
            rows: board.current(),
        });

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                maybe = board.changed() => {
                    match maybe {
                        Some(rows) => {
                            let _ = action_tx.send(Action::BoardUpdated { owner, rows });
                        }
                        None => break,
                    }
                }
            }
        }

        board.shutdown().await;
    });
}
