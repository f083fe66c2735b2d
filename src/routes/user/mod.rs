mod handler;
mod model;

pub use handler::{
    change_password,
    create_user,
    delete_user,
    get_me,
    get_user,
    list_users,
    login,
    update_me,
    update_user,
};
