pub mod comment;
pub mod game;
pub mod history;
pub mod notification;
pub mod post;
pub mod request;
pub mod user;

pub use comment::Comment;
pub use game::Game;
pub use history::History;
pub use notification::Notification;
pub use post::Post;
pub use request::GameRequest;
pub use user::User;
