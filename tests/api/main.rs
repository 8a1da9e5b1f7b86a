mod bookmarks;
mod http_client;
mod manga;
mod profile;
