/*!
Accessibility vocabulary: roles, values and notifications.
*/

mod notification;
mod role;
mod value;

pub use notification::Notification;
pub use role::Role;
pub use value::Value;
