#[macro_use]
extern crate rocket;

#[launch]
#[cfg(not(tarpaulin_include))]
async fn rocket() -> _ {
    foodgram_api::rocket().await
}
