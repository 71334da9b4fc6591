mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

// These flows need a live PostgreSQL store; without DATABASE_URL they are
// skipped so the suite still passes in a bare environment.

fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

async fn authed_client(server: &common::TestServer) -> Result<(reqwest::Client, String)> {
    let username = unique("tester");
    common::create_user(&username, "test-password")?;

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({"username": username, "password": "test-password"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert!(body["access"].is_string());
    assert!(body["refresh"].is_string());
    assert_eq!(body["user"]["username"], username);
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let token = body["access"].as_str().expect("access token").to_string();
    Ok((client, token))
}

#[tokio::test]
async fn organization_aggregates_and_detail_shape() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let (client, token) = authed_client(server).await?;
    let bearer = format!("Bearer {}", token);

    // Fresh organization starts with zeroed aggregates
    let res = client
        .post(format!("{}/organizations", server.base_url))
        .header("Authorization", &bearer)
        .json(&json!({"name": "Acme", "hq_address": "1 Main St"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let org = res.json::<Value>().await?;
    let org_id = org["id"].as_i64().expect("organization id");
    assert_eq!(org["acos_count"], 0);
    assert_eq!(org["total_savings"], "0");

    // Two savings rows sum exactly
    for amount in ["100.50", "49.50"] {
        let res = client
            .post(format!("{}/savings", server.base_url))
            .header("Authorization", &bearer)
            .json(&json!({"organization": org_id, "amount": amount, "year": 2024}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // List returns the summary shape: aggregates present, no nested arrays
    let res = client
        .get(format!("{}/organizations", server.base_url))
        .header("Authorization", &bearer)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let listed = res.json::<Value>().await?;
    let entry = listed
        .as_array()
        .expect("array")
        .iter()
        .find(|o| o["id"].as_i64() == Some(org_id))
        .expect("created organization in list");
    assert_eq!(entry["total_savings"], "150.00");
    assert!(entry.get("savings").is_none());

    // Retrieve returns the detail shape with nested collections
    let res = client
        .get(format!("{}/organizations/{}", server.base_url, org_id))
        .header("Authorization", &bearer)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let detail = res.json::<Value>().await?;
    assert_eq!(detail["total_savings"], "150.00");
    assert_eq!(detail["savings"].as_array().expect("savings array").len(), 2);
    assert_eq!(detail["acos"].as_array().expect("acos array").len(), 0);
    assert_eq!(detail["workshops"].as_array().expect("workshops").len(), 0);

    Ok(())
}

#[tokio::test]
async fn aco_filtering_and_program_detach() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let (client, token) = authed_client(server).await?;
    let bearer = format!("Bearer {}", token);

    let create = |path: &'static str, body: Value| {
        let client = client.clone();
        let bearer = bearer.clone();
        let url = format!("{}{}", server.base_url, path);
        async move {
            let res = client
                .post(url)
                .header("Authorization", &bearer)
                .json(&body)
                .send()
                .await?;
            assert_eq!(res.status(), StatusCode::CREATED, "POST {}", path);
            Ok::<Value, anyhow::Error>(res.json::<Value>().await?)
        }
    };

    let org_a = create("/organizations", json!({"name": "Org A", "hq_address": "A St"})).await?;
    let org_b = create("/organizations", json!({"name": "Org B", "hq_address": "B St"})).await?;
    let program = create("/programs", json!({"name": "Shared Savings"})).await?;

    let aco_a = create(
        "/acos",
        json!({
            "name": "ACO A",
            "organization": org_a["id"],
            "program": program["id"],
            "projected_savings": "1200.00",
            "score": "A"
        }),
    )
    .await?;
    create("/acos", json!({"name": "ACO B", "organization": org_b["id"]})).await?;

    // Program name resolved through the relationship
    assert_eq!(aco_a["program"], program["id"]);
    assert_eq!(aco_a["program_name"], "Shared Savings");

    // Filtered list returns only org A's ACOs
    let res = client
        .get(format!(
            "{}/acos?organization={}",
            server.base_url, org_a["id"]
        ))
        .header("Authorization", &bearer)
        .send()
        .await?;
    let filtered = res.json::<Value>().await?;
    let filtered = filtered.as_array().expect("array");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["name"], "ACO A");

    // Unfiltered list contains both
    let res = client
        .get(format!("{}/acos", server.base_url))
        .header("Authorization", &bearer)
        .send()
        .await?;
    let all = res.json::<Value>().await?;
    assert!(all.as_array().expect("array").len() >= 2);

    // Deleting the program detaches, never deletes, its ACOs
    let res = client
        .delete(format!("{}/programs/{}", server.base_url, program["id"]))
        .header("Authorization", &bearer)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/acos/{}", server.base_url, aco_a["id"]))
        .header("Authorization", &bearer)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let detached = res.json::<Value>().await?;
    assert!(detached["program"].is_null());
    assert!(detached["program_name"].is_null());

    Ok(())
}

#[tokio::test]
async fn organization_delete_cascades() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let (client, token) = authed_client(server).await?;
    let bearer = format!("Bearer {}", token);

    let res = client
        .post(format!("{}/organizations", server.base_url))
        .header("Authorization", &bearer)
        .json(&json!({"name": "Doomed", "hq_address": "Nowhere"}))
        .send()
        .await?;
    let org = res.json::<Value>().await?;
    let org_id = org["id"].as_i64().expect("id");

    let res = client
        .post(format!("{}/workshops", server.base_url))
        .header("Authorization", &bearer)
        .json(&json!({
            "organization": org_id,
            "title": "Kickoff",
            "value": "500.00",
            "date": "2024-03-01"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let workshop = res.json::<Value>().await?;

    let res = client
        .delete(format!("{}/organizations/{}", server.base_url, org_id))
        .header("Authorization", &bearer)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Children went with the parent
    let res = client
        .get(format!("{}/workshops/{}", server.base_url, workshop["id"]))
        .header("Authorization", &bearer)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Parent itself is gone
    let res = client
        .get(format!("{}/organizations/{}", server.base_url, org_id))
        .header("Authorization", &bearer)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn validation_and_not_found_errors() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let (client, token) = authed_client(server).await?;
    let bearer = format!("Bearer {}", token);

    // Missing required fields are reported by name
    let res = client
        .post(format!("{}/organizations", server.base_url))
        .header("Authorization", &bearer)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["name"], "This field is required");
    assert_eq!(body["field_errors"]["hq_address"], "This field is required");

    // Referencing a nonexistent organization is a validation error, not a 500
    let res = client
        .post(format!("{}/savings", server.base_url))
        .header("Authorization", &bearer)
        .json(&json!({"organization": 999_999_999, "amount": "10.00", "year": 2024}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Wrong field type
    let res = client
        .post(format!("{}/savings", server.base_url))
        .header("Authorization", &bearer)
        .json(&json!({"organization": 1, "amount": "10.00", "year": "not-a-year"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Unknown ids 404 on every mutating verb
    for req in [
        client.get(format!("{}/programs/999999999", server.base_url)),
        client.patch(format!("{}/programs/999999999", server.base_url)),
        client.delete(format!("{}/programs/999999999", server.base_url)),
    ] {
        let res = req
            .header("Authorization", &bearer)
            .json(&json!({"name": "x"}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    Ok(())
}

#[tokio::test]
async fn partial_update_touches_only_supplied_fields() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let (client, token) = authed_client(server).await?;
    let bearer = format!("Bearer {}", token);

    let res = client
        .post(format!("{}/programs", server.base_url))
        .header("Authorization", &bearer)
        .json(&json!({"name": "Original", "description": "keep me"}))
        .send()
        .await?;
    let program = res.json::<Value>().await?;

    let res = client
        .patch(format!("{}/programs/{}", server.base_url, program["id"]))
        .header("Authorization", &bearer)
        .json(&json!({"name": "Renamed"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<Value>().await?;
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["description"], "keep me");

    // Explicit null clears the nullable column
    let res = client
        .patch(format!("{}/programs/{}", server.base_url, program["id"]))
        .header("Authorization", &bearer)
        .json(&json!({"description": null}))
        .send()
        .await?;
    let cleared = res.json::<Value>().await?;
    assert!(cleared["description"].is_null());
    assert_eq!(cleared["name"], "Renamed");

    Ok(())
}

#[tokio::test]
async fn refresh_token_issues_new_access_token() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let username = unique("refresher");
    common::create_user(&username, "test-password")?;

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({"username": username, "password": "test-password"}))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    let refresh = body["refresh"].as_str().expect("refresh token");

    let res = client
        .post(format!("{}/login/refresh", server.base_url))
        .json(&json!({"refresh": refresh}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let refreshed = res.json::<Value>().await?;
    let access = refreshed["access"].as_str().expect("new access token");

    // The refreshed access token works against protected routes
    let res = client
        .get(format!("{}/organizations", server.base_url))
        .header("Authorization", format!("Bearer {}", access))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // An access token is not accepted where a refresh token is expected
    let res = client
        .post(format!("{}/login/refresh", server.base_url))
        .json(&json!({"refresh": body["access"]}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
