use poem_openapi::Object;

#[derive(Object, Debug)]
pub struct SaveLineFieldRequestDto {
    #[oai(validator(min_length = 1, max_length = 500))]
    pub value: String,
}

/// User access token obtained by the browser-side Facebook login dialog.
#[derive(Object)]
pub struct FacebookSessionRequestDto {
    #[oai(validator(min_length = 1))]
    pub access_token: String,
}
