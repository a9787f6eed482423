use std::collections::HashSet;

use foodgram_types::{
    CreateIngredient, CreateRecipe, CreateTag, CreateUser, IngredientAmount, ModifyRecipe,
    ValidationErrors,
};
use itertools::Itertools;
use rocket::serde::{Deserialize, Serialize};

/// Field bounds, configurable under the `validation` key.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(crate = "rocket::serde", default)]
pub struct Limits {
    pub name_len: usize,
    pub text_len: usize,
    pub user_name_len: usize,
    pub email_len: usize,
    pub password_len: usize,
    pub min_cooking_time: i32,
    pub max_cooking_time: i32,
    pub min_amount: i32,
    pub max_amount: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            name_len: 200,
            text_len: 5000,
            user_name_len: 150,
            email_len: 254,
            password_len: 150,
            min_cooking_time: 1,
            max_cooking_time: 500,
            min_amount: 1,
            max_amount: 32000,
        }
    }
}

fn check_required(field: &str, value: &str, max_len: usize, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(field, "This field may not be blank");
    } else if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {} characters", max_len),
        );
    }
}

fn check_ingredients(
    ingredients: &[IngredientAmount],
    limits: &Limits,
    errors: &mut ValidationErrors,
) {
    if ingredients.is_empty() {
        errors.add("ingredients", "At least one ingredient is required");
        return;
    }
    for id in ingredients.iter().map(|i| i.id).duplicates() {
        errors.add("ingredients", format!("Ingredient {} is listed more than once", id));
    }
    for item in ingredients {
        if item.amount < limits.min_amount || item.amount > limits.max_amount {
            errors.add(
                "ingredients",
                format!(
                    "Amount of ingredient {} must be between {} and {}",
                    item.id, limits.min_amount, limits.max_amount
                ),
            );
        }
    }
}

fn check_tags(tags: &[i32], errors: &mut ValidationErrors) {
    if tags.is_empty() {
        errors.add("tags", "At least one tag is required");
        return;
    }
    for id in tags.iter().duplicates() {
        errors.add("tags", format!("Tag {} is listed more than once", id));
    }
}

fn check_cooking_time(cooking_time: i32, limits: &Limits, errors: &mut ValidationErrors) {
    if cooking_time < limits.min_cooking_time || cooking_time > limits.max_cooking_time {
        errors.add(
            "cooking_time",
            format!(
                "Cooking time must be between {} and {} minutes",
                limits.min_cooking_time, limits.max_cooking_time
            ),
        );
    }
}

pub fn validate_new_recipe(payload: &CreateRecipe, limits: &Limits) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_ingredients(&payload.ingredients, limits, &mut errors);
    check_tags(&payload.tags, &mut errors);
    check_cooking_time(payload.cooking_time, limits, &mut errors);
    check_required("name", &payload.name, limits.name_len, &mut errors);
    check_required("text", &payload.text, limits.text_len, &mut errors);
    if payload.image.trim().is_empty() {
        errors.add("image", "This field may not be blank");
    }
    errors.into_result()
}

pub fn validate_recipe_update(
    payload: &ModifyRecipe,
    limits: &Limits,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_ingredients(&payload.ingredients, limits, &mut errors);
    check_tags(&payload.tags, &mut errors);
    if let Some(cooking_time) = payload.cooking_time {
        check_cooking_time(cooking_time, limits, &mut errors);
    }
    if let Some(name) = &payload.name {
        check_required("name", name, limits.name_len, &mut errors);
    }
    if let Some(text) = &payload.text {
        check_required("text", text, limits.text_len, &mut errors);
    }
    if matches!(&payload.image, Some(image) if image.trim().is_empty()) {
        errors.add("image", "This field may not be blank");
    }
    errors.into_result()
}

/// Ids in `requested` that are absent from `found`, in request order.
pub fn missing_ids(requested: impl IntoIterator<Item = i32>, found: &[i32]) -> Vec<i32> {
    let found: HashSet<i32> = found.iter().copied().collect();
    requested
        .into_iter()
        .filter(|id| !found.contains(id))
        .unique()
        .collect()
}

/// Same charset as Django's `UnicodeUsernameValidator`.
fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

pub fn check_password(field: &str, password: &str, limits: &Limits, errors: &mut ValidationErrors) {
    if password.is_empty() {
        errors.add(field, "This field may not be blank");
    } else if password.chars().count() > limits.password_len {
        errors.add(
            field,
            format!(
                "Ensure this field has no more than {} characters",
                limits.password_len
            ),
        );
    }
}

pub fn validate_new_user(payload: &CreateUser, limits: &Limits) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_required("email", &payload.email, limits.email_len, &mut errors);
    if !payload.email.is_empty() && !is_valid_email(&payload.email) {
        errors.add("email", "Enter a valid email address");
    }
    check_required("username", &payload.username, limits.user_name_len, &mut errors);
    if !is_valid_username(&payload.username) {
        errors.add(
            "username",
            "Username may contain only letters, digits and @/./+/-/_ characters",
        );
    }
    check_required("first_name", &payload.first_name, limits.user_name_len, &mut errors);
    check_required("last_name", &payload.last_name, limits.user_name_len, &mut errors);
    check_password("password", &payload.password, limits, &mut errors);
    errors.into_result()
}

fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn is_valid_slug(slug: &str) -> bool {
    slug.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn validate_new_tag(payload: &CreateTag, limits: &Limits) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_required("name", &payload.name, limits.name_len, &mut errors);
    check_required("slug", &payload.slug, limits.name_len, &mut errors);
    if !is_valid_slug(&payload.slug) {
        errors.add(
            "slug",
            "Slug may contain only latin letters, digits, hyphens and underscores",
        );
    }
    if !is_valid_color(&payload.color) {
        errors.add("color", "Color must be a hex code like #1A2B3C");
    }
    errors.into_result()
}

pub fn validate_new_ingredient(
    payload: &CreateIngredient,
    limits: &Limits,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_required("name", &payload.name, limits.name_len, &mut errors);
    check_required(
        "measurement_unit",
        &payload.measurement_unit,
        limits.name_len,
        &mut errors,
    );
    errors.into_result()
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub fn valid_recipe() -> CreateRecipe {
        CreateRecipe {
            ingredients: vec![
                IngredientAmount { id: 1, amount: 200 },
                IngredientAmount { id: 2, amount: 2 },
            ],
            tags: vec![1],
            image: "data:image/png;base64,iVBORw0KGgo=".to_string(),
            name: "Pancakes".to_string(),
            text: "Mix and fry.".to_string(),
            cooking_time: 20,
        }
    }

    #[test]
    fn accepts_valid_recipe() {
        assert!(validate_new_recipe(&valid_recipe(), &Limits::default()).is_ok());
    }

    #[test]
    fn rejects_duplicate_ingredient_ids() {
        let mut recipe = valid_recipe();
        recipe.ingredients.push(IngredientAmount { id: 1, amount: 5 });
        let errors = validate_new_recipe(&recipe, &Limits::default()).unwrap_err();
        assert!(errors.contains("ingredients"));
        assert_eq!(errors.0["ingredients"].len(), 1);
    }

    #[test]
    fn duplicate_is_detected_regardless_of_amount() {
        let mut recipe = valid_recipe();
        recipe.ingredients = vec![
            IngredientAmount { id: 7, amount: 1 },
            IngredientAmount { id: 7, amount: 1 },
        ];
        assert!(validate_new_recipe(&recipe, &Limits::default()).is_err());
    }

    #[test]
    fn rejects_empty_ingredients_and_tags() {
        let mut recipe = valid_recipe();
        recipe.ingredients.clear();
        recipe.tags.clear();
        let errors = validate_new_recipe(&recipe, &Limits::default()).unwrap_err();
        assert!(errors.contains("ingredients"));
        assert!(errors.contains("tags"));
    }

    #[test]
    fn rejects_out_of_range_amounts() {
        let limits = Limits::default();
        for amount in [0, -3, limits.max_amount + 1] {
            let mut recipe = valid_recipe();
            recipe.ingredients[0].amount = amount;
            let errors = validate_new_recipe(&recipe, &limits).unwrap_err();
            assert!(errors.contains("ingredients"), "amount {}", amount);
        }
        let mut recipe = valid_recipe();
        recipe.ingredients[0].amount = limits.max_amount;
        assert!(validate_new_recipe(&recipe, &limits).is_ok());
    }

    #[test]
    fn cooking_time_bounds_follow_limits() {
        let limits = Limits {
            max_cooking_time: 60,
            ..Default::default()
        };
        let mut recipe = valid_recipe();
        recipe.cooking_time = 61;
        assert!(validate_new_recipe(&recipe, &limits)
            .unwrap_err()
            .contains("cooking_time"));
        recipe.cooking_time = 0;
        assert!(validate_new_recipe(&recipe, &limits).is_err());
        recipe.cooking_time = 60;
        assert!(validate_new_recipe(&recipe, &limits).is_ok());
    }

    #[test]
    fn reports_every_field() {
        let recipe = CreateRecipe {
            ingredients: vec![],
            tags: vec![2, 2],
            image: " ".to_string(),
            name: "".to_string(),
            text: "x".repeat(5001),
            cooking_time: 1000,
        };
        let errors = validate_new_recipe(&recipe, &Limits::default()).unwrap_err();
        for field in ["ingredients", "tags", "image", "name", "text", "cooking_time"] {
            assert!(errors.contains(field), "missing {}", field);
        }
    }

    #[test]
    fn update_skips_absent_fields() {
        let payload = ModifyRecipe {
            ingredients: vec![IngredientAmount { id: 3, amount: 1 }],
            tags: vec![1],
            image: None,
            name: None,
            text: None,
            cooking_time: None,
        };
        assert!(validate_recipe_update(&payload, &Limits::default()).is_ok());

        let payload = ModifyRecipe {
            ingredients: vec![
                IngredientAmount { id: 3, amount: 1 },
                IngredientAmount { id: 3, amount: 2 },
            ],
            cooking_time: Some(0),
            ..payload
        };
        let errors = validate_recipe_update(&payload, &Limits::default()).unwrap_err();
        assert!(errors.contains("ingredients"));
        assert!(errors.contains("cooking_time"));
    }

    #[test]
    fn missing_ids_keeps_order() {
        assert_eq!(missing_ids([4, 1, 9, 4], &[1, 2, 3]), vec![4, 9]);
        assert!(missing_ids([1, 2], &[2, 1]).is_empty());
    }

    #[test]
    fn user_validation() {
        let user = CreateUser {
            email: "cook@example.com".to_string(),
            username: "cook.42".to_string(),
            first_name: "Julia".to_string(),
            last_name: "Child".to_string(),
            password: "s3cret".to_string(),
        };
        assert!(validate_new_user(&user, &Limits::default()).is_ok());

        let bad = CreateUser {
            email: "not-an-email".to_string(),
            username: "white space".to_string(),
            password: "".to_string(),
            ..user
        };
        let errors = validate_new_user(&bad, &Limits::default()).unwrap_err();
        assert!(errors.contains("email"));
        assert!(errors.contains("username"));
        assert!(errors.contains("password"));
        assert!(!errors.contains("first_name"));
    }

    #[test]
    fn tag_validation() {
        let tag = CreateTag {
            name: "Breakfast".to_string(),
            color: "#E26C2D".to_string(),
            slug: "breakfast".to_string(),
        };
        assert!(validate_new_tag(&tag, &Limits::default()).is_ok());

        let bad = CreateTag {
            color: "red".to_string(),
            slug: "brunch time".to_string(),
            ..tag
        };
        let errors = validate_new_tag(&bad, &Limits::default()).unwrap_err();
        assert!(errors.contains("color"));
        assert!(errors.contains("slug"));
    }
}
