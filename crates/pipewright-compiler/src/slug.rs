/// Lower-case `name` and collapse each whitespace run into one hyphen.
pub fn slugify(name: &str) -> String {
  let mut slug = String::with_capacity(name.len());
  let mut in_whitespace = false;

  for ch in name.chars() {
    if ch.is_whitespace() {
      if !in_whitespace {
        slug.push('-');
      }
      in_whitespace = true;
    } else {
      in_whitespace = false;
      slug.extend(ch.to_lowercase());
    }
  }

  slug
}

/// Job key for the job compiled from a host node.
pub fn job_key(host_name: &str) -> String {
  format!("run-on-{}", slugify(host_name))
}
