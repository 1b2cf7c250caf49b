mod common;

use anyhow::Result;
use common::{bootcamp_body, course_body, TestServer};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn bootcamp_with_owner(server: &TestServer) -> Result<(String, String)> {
    let token = server.register("Owner", "owner@example.com", "publisher").await?;
    let (status, body) = server
        .create_bootcamp(&token, bootcamp_body("Devworks", "Boston 02215"))
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "bootcamp create failed: {}", body);
    Ok((token, body["data"]["id"].as_str().unwrap_or_default().to_string()))
}

async fn bootcamp(server: &TestServer, id: &str) -> Result<Value> {
    let (_, body) = server.get_json(&format!("/bootcamps/{}", id)).await?;
    Ok(body["data"].clone())
}

#[tokio::test]
async fn average_cost_follows_course_changes() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, id) = bootcamp_with_owner(&server).await?;

    let (status, first) = server.create_course(&token, &id, course_body("Front End", 8000)).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", first);
    assert_eq!(first["data"]["bootcamp"], id.as_str());
    let (_, second) = server.create_course(&token, &id, course_body("Back End", 10001)).await?;

    assert_eq!(bootcamp(&server, &id).await?["averageCost"], 9000.5);

    let course_id = second["data"]["id"].as_str().unwrap_or_default().to_string();
    let res = server
        .client
        .put(server.url(&format!("/courses/{}", course_id)))
        .bearer_auth(&token)
        .json(&json!({"tuition": 12000}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(bootcamp(&server, &id).await?["averageCost"], 10000.0);

    let res = server
        .client
        .delete(server.url(&format!("/courses/{}", course_id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({"success": true, "data": {}}));
    assert_eq!(bootcamp(&server, &id).await?["averageCost"], 8000.0);

    let first_id = first["data"]["id"].as_str().unwrap_or_default().to_string();
    server
        .client
        .delete(server.url(&format!("/courses/{}", first_id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert!(bootcamp(&server, &id).await?.get("averageCost").is_none());
    Ok(())
}

#[tokio::test]
async fn only_the_bootcamp_owner_adds_courses() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, id) = bootcamp_with_owner(&server).await?;
    let other = server.register("Other", "other@example.com", "publisher").await?;
    let reader = server.register("Reader", "reader@example.com", "user").await?;

    let (status, _) = server.create_course(&other, &id, course_body("Sneaky", 100)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = server.create_course(&reader, &id, course_body("Sneaky", 100)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .create_course(&other, &uuid::Uuid::new_v4().to_string(), course_body("Orphan", 100))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
    Ok(())
}

#[tokio::test]
async fn course_owner_or_admin_may_edit() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (owner, id) = bootcamp_with_owner(&server).await?;
    let other = server.register("Other", "other@example.com", "publisher").await?;
    let admin = server.admin_token("admin@example.com").await?;

    let (_, course) = server.create_course(&owner, &id, course_body("Front End", 8000)).await?;
    let course_id = course["data"]["id"].as_str().unwrap_or_default().to_string();
    let course_path = server.url(&format!("/courses/{}", course_id));

    let res = server
        .client
        .put(&course_path)
        .bearer_auth(&other)
        .json(&json!({"tuition": 1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = server.client.delete(&course_path).bearer_auth(&other).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(bootcamp(&server, &id).await?["averageCost"], 8000.0);

    let res = server
        .client
        .put(&course_path)
        .bearer_auth(&admin)
        .json(&json!({"tuition": 6000}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["tuition"], 6000.0);
    assert_eq!(bootcamp(&server, &id).await?["averageCost"], 6000.0);

    let res = server.client.delete(&course_path).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let (status, _) = server.get_json(&format!("/courses/{}", course_id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn course_reads_populate_their_bootcamp() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, id) = bootcamp_with_owner(&server).await?;
    let (_, course) = server.create_course(&token, &id, course_body("Front End", 8000)).await?;
    let course_id = course["data"]["id"].as_str().unwrap_or_default();

    let (status, body) = server.get_json(&format!("/courses/{}", course_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bootcamp"]["name"], "Devworks");
    assert!(body["data"]["bootcamp"]["description"].is_string());

    let (_, body) = server.get_json(&format!("/bootcamps/{}/courses", id)).await?;
    assert_eq!(body["count"], 1);
    assert!(body.get("pagination").is_none());

    let (_, body) = server.get_json("/bootcamps").await?;
    assert_eq!(body["data"][0]["courses"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn reviews_drive_average_rating() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (owner, id) = bootcamp_with_owner(&server).await?;
    let alice = server.register("Alice", "alice@example.com", "user").await?;
    let bob = server.register("Bob", "bob@example.com", "user").await?;

    let (status, _) = server
        .create_review(&owner, &id, json!({"title": "Mine", "text": "Best", "rating": 10}))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .create_review(&alice, &id, json!({"title": "Great", "text": "Loved it", "rating": 8}))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let (status, body) = server
        .create_review(&alice, &id, json!({"title": "Again", "text": "Still good", "rating": 9}))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "You have already reviewed this bootcamp");

    let (status, _) = server
        .create_review(&bob, &id, json!({"title": "Meh", "text": "Too fast", "rating": 11}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    server
        .create_review(&bob, &id, json!({"title": "Meh", "text": "Too fast", "rating": 5}))
        .await?;

    assert_eq!(bootcamp(&server, &id).await?["averageRating"], 6.5);

    let (_, body) = server.get_json(&format!("/bootcamps/{}/reviews", id)).await?;
    assert_eq!(body["count"], 2);
    Ok(())
}

#[tokio::test]
async fn review_owner_or_admin_may_edit() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, id) = bootcamp_with_owner(&server).await?;
    let alice = server.register("Alice", "alice@example.com", "user").await?;
    let bob = server.register("Bob", "bob@example.com", "user").await?;
    let admin = server.admin_token("admin@example.com").await?;

    let (_, body) = server
        .create_review(&alice, &id, json!({"title": "Great", "text": "Loved it", "rating": 8}))
        .await?;
    let review_path = server.url(&format!("/reviews/{}", body["data"]["id"].as_str().unwrap_or_default()));

    let res = server
        .client
        .put(&review_path)
        .bearer_auth(&bob)
        .json(&json!({"rating": 1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .put(&review_path)
        .bearer_auth(&alice)
        .json(&json!({"rating": 4}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(bootcamp(&server, &id).await?["averageRating"], 4.0);

    let res = server.client.delete(&review_path).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(bootcamp(&server, &id).await?.get("averageRating").is_none());
    Ok(())
}

#[tokio::test]
async fn deleting_a_bootcamp_cascades() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (owner, id) = bootcamp_with_owner(&server).await?;
    let alice = server.register("Alice", "alice@example.com", "user").await?;

    let (_, course) = server.create_course(&owner, &id, course_body("Front End", 8000)).await?;
    let (_, review) = server
        .create_review(&alice, &id, json!({"title": "Great", "text": "Loved it", "rating": 8}))
        .await?;

    let res = server
        .client
        .delete(server.url(&format!("/bootcamps/{}", id)))
        .bearer_auth(&owner)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let (status, _) = server.get_json(&format!("/bootcamps/{}", id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server
        .get_json(&format!("/courses/{}", course["data"]["id"].as_str().unwrap_or_default()))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server
        .get_json(&format!("/reviews/{}", review["data"]["id"].as_str().unwrap_or_default()))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = server.get_json("/courses").await?;
    assert_eq!(body["count"], 0);

    let res = server
        .client
        .delete(server.url(&format!("/bootcamps/{}", id)))
        .bearer_auth(&owner)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = server
        .client
        .delete(server.url(&format!("/courses/{}", uuid::Uuid::new_v4())))
        .bearer_auth(&owner)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
