pub mod vapid;
