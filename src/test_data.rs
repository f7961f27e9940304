#[cfg(test)]
pub const POST_DATA: &str = "---
layout: post
title: How to run a code review
date: 2020-05-22 10:15:00 -0700
categories: engineering process
author: thiago
---

Code reviews are the cheapest quality tool a team has.

This is how I run mine after twenty years of doing them.

<!-- more -->

## Start with the tests

Read the tests first. They tell you what the author believes the change does.

A review that starts with the implementation ends in style nitpicks.
";

#[cfg(test)]
pub const POST_DATA_NO_BREAK: &str = "---
title: Sourdough starter notes
date: 2021-11-03 08:00:00 +0100
categories: cooking
author: ana
---

Feed the starter every morning.

Keep it warm and it doubles by noon.
";
